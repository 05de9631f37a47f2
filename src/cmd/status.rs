//! Execution status commands.

use anyhow::{Result, anyhow};

use deviceiq::device::{DeviceKey, ExecutionStatus};
use deviceiq::session::Session;

pub fn cmd_status_set(
    project_dir: &std::path::Path,
    model: &str,
    os: &str,
    flow: &str,
    status: &str,
) -> Result<()> {
    let status = status.parse::<ExecutionStatus>().map_err(|e| anyhow!(e))?;
    let mut session = Session::open(project_dir)?;
    let key = DeviceKey::new(model, os);
    session.state.matrix.set_status(key.clone(), flow, status);
    session.save()?;
    println!("{} / {} -> {}", key, flow, status);
    Ok(())
}

pub fn cmd_status_show(project_dir: &std::path::Path) -> Result<()> {
    let session = Session::open(project_dir)?;
    let board = session.state.matrix.statuses();

    if board.is_empty() {
        println!("No execution statuses recorded yet.");
        return Ok(());
    }

    println!("{}", console::style("Execution Status").bold());
    for (key, flows) in board.iter() {
        println!("{}:", key);
        for (flow, status) in flows {
            let styled = match status {
                ExecutionStatus::Passed => console::style(status.as_str()).green(),
                ExecutionStatus::Failed => console::style(status.as_str()).red(),
                ExecutionStatus::Running => console::style(status.as_str()).cyan(),
                ExecutionStatus::Pending => console::style(status.as_str()).dim(),
            };
            println!("  {:<24} [{}]", flow, styled);
        }
    }
    Ok(())
}
