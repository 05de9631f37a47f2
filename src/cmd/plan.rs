//! Plan library and plan export commands.

use anyhow::{Context, Result};

use deviceiq::plan::{entries_to_csv, entries_to_json};
use deviceiq::session::Session;

use super::super::PlanCommands;

pub fn cmd_plan(project_dir: &std::path::Path, command: PlanCommands) -> Result<()> {
    let mut session = Session::open(project_dir)?;

    match command {
        PlanCommands::Save { name } => {
            let entries = session.state.matrix.plan_entries();
            if entries.is_empty() {
                anyhow::bail!("The working matrix is empty; nothing to save");
            }
            let plan = session.state.library.save_snapshot(&name, entries);
            println!("Saved plan '{}' ({})", plan.name, plan.id);
            session.save()?;
        }
        PlanCommands::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read plan file at {}", file.display()))?;
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "imported-plan".to_string());
            let plan = session.state.library.import(&name, &content)?;
            println!(
                "Imported plan '{}' ({}) with {} devices",
                plan.name,
                plan.id,
                plan.data.len()
            );
            session.save()?;
        }
        PlanCommands::Export { format, output } => {
            let entries = session.state.matrix.plan_entries();
            if entries.is_empty() {
                anyhow::bail!("The working matrix is empty; nothing to export");
            }
            let rendered = match format.as_str() {
                "csv" => entries_to_csv(&entries)?,
                "json" => entries_to_json(&entries)?,
                other => anyhow::bail!("Unknown format '{}'. Valid values: json, csv", other),
            };
            write_artifact(rendered, output.as_deref())?;
        }
        PlanCommands::List => {
            if session.state.library.list().is_empty() {
                println!("No saved plans.");
                return Ok(());
            }
            println!("{}", console::style("Saved Plans").bold());
            let selected = session.state.library.selected().map(|p| p.id.clone());
            for plan in session.state.library.list() {
                let marker = if selected.as_deref() == Some(&plan.id) {
                    ">"
                } else {
                    " "
                };
                println!(
                    " {} {}  {} ({} devices, {})",
                    marker,
                    plan.id,
                    plan.name,
                    plan.data.len(),
                    plan.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        PlanCommands::Show { id } => {
            let plan = session.state.library.get(&id)?;
            println!("{} ({})", console::style(&plan.name).bold(), plan.id);
            for entry in &plan.data {
                println!(
                    "  {} ({}): {}",
                    entry.device_model,
                    entry.os_version,
                    entry.flows.join(", ")
                );
            }
        }
        PlanCommands::Select { id } => {
            session.state.library.select(&id)?;
            println!("Selected plan {}", id);
            session.save()?;
        }
        PlanCommands::Download { id, output } => {
            let artifact = session.state.library.download(&id)?;
            write_artifact(artifact, output.as_deref())?;
        }
        PlanCommands::Delete { id } => {
            session.state.library.delete(&id)?;
            println!("Deleted plan {}", id);
            session.save()?;
        }
        PlanCommands::Load { id } => {
            let entries = session.state.library.get(&id)?.data.clone();
            session.state.matrix.load_plan(&entries);
            println!(
                "Loaded plan {} into the working matrix ({} devices).",
                id,
                entries.len()
            );
            println!("Overrides, threshold and statuses were reset to defaults.");
            session.save()?;
        }
    }
    Ok(())
}

fn write_artifact(content: String, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write artifact to {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
