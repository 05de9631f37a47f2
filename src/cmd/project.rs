//! Project initialization, session reset, and the matrix view.

use anyhow::Result;

pub fn cmd_init(project_dir: &std::path::Path) -> Result<()> {
    use deviceiq::session::Session;

    let was_initialized = Session::is_initialized(project_dir);
    let session = Session::init(project_dir)?;

    if was_initialized {
        println!(
            "deviceiq project already initialized at {}",
            Session::dir_for(project_dir).display()
        );
    } else {
        session.save()?;
        println!(
            "Initialized deviceiq project at {}",
            Session::dir_for(project_dir).display()
        );
        println!();
        println!("Next steps:");
        println!("  1. Run `deviceiq generate <usage.csv> --threshold 80` to build a matrix");
        println!("  2. Adjust it with `deviceiq pin` / `deviceiq exclude` / `deviceiq flows`");
        println!("  3. Snapshot it with `deviceiq plan save <name>`");
    }

    Ok(())
}

pub fn cmd_reset(project_dir: &std::path::Path, force: bool) -> Result<()> {
    use deviceiq::session::Session;

    if !Session::is_initialized(project_dir) {
        println!("Not initialized. Nothing to reset.");
        return Ok(());
    }
    if !force {
        println!("This discards the working matrix, overrides, statuses and saved plans.");
        println!("Re-run with --force to confirm.");
        return Ok(());
    }
    Session::reset(project_dir)?;
    println!("Session state cleared.");
    Ok(())
}

/// Render the working matrix, overrides, and summary.
pub fn cmd_matrix(project_dir: &std::path::Path) -> Result<()> {
    use deviceiq::session::Session;

    let session = Session::open(project_dir)?;
    let matrix = &session.state.matrix;

    if matrix.is_empty() {
        println!("No matrix yet. Run `deviceiq generate <usage.csv>` first.");
        return Ok(());
    }

    let working = matrix.working_matrix();
    println!();
    println!(
        "{}",
        console::style(format!(
            "Working Matrix (threshold {}%)",
            matrix.threshold()
        ))
        .bold()
    );
    println!();
    println!(
        "   {:<28} {:<16} {:>8} {:>12}  Flows",
        "Device Model", "OS Version", "Usage %", "Cumulative %"
    );
    for device in &working {
        let key = device.key();
        let marker = if matrix.overrides().is_pinned(&key) {
            console::style("*").yellow().to_string()
        } else {
            " ".to_string()
        };
        let flows = matrix
            .assignments()
            .get(&key)
            .map(|f| f.join(", "))
            .unwrap_or_default();
        println!(
            " {} {:<28} {:<16} {:>8.2} {:>12.2}  {}",
            marker, device.device_model, device.os_version, device.usage_percent,
            device.cumulative_coverage, flows
        );
    }

    let excluded: Vec<String> = matrix
        .overrides()
        .excluded()
        .map(|k| k.to_string())
        .collect();
    if !excluded.is_empty() {
        println!();
        println!("Excluded: {}", console::style(excluded.join(", ")).dim());
    }

    let summary = matrix.summary();
    println!();
    println!(
        "{} of {} devices in matrix, covering {:.2}% of {:.2}% total usage",
        summary.included_devices,
        summary.total_devices,
        summary.covered_usage_percent,
        summary.total_usage_percent
    );
    println!("  (* = pinned)");
    Ok(())
}
