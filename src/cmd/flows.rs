//! Flow assignment and flow catalog commands.

use anyhow::Result;

use deviceiq::catalog::{CatalogStore, FlowCatalog};
use deviceiq::device::DeviceKey;
use deviceiq::session::Session;

use super::super::{CatalogCommands, FlowsCommands};

fn show_assignment(session: &Session, key: &DeviceKey) {
    match session.state.matrix.assignments().get(key) {
        Some(flows) if flows.is_empty() => println!("{}: (no flows selected)", key),
        Some(flows) => {
            println!("{}:", key);
            for (index, flow) in flows.iter().enumerate() {
                let status = session.state.matrix.status(key, flow);
                println!("  {}. {:<24} [{}]", index + 1, flow, status);
            }
        }
        None => println!("{} has no flow assignment (not in the matrix).", key),
    }
}

pub fn cmd_flows(project_dir: &std::path::Path, command: FlowsCommands) -> Result<()> {
    let mut session = Session::open(project_dir)?;
    let catalog = CatalogStore::open_default()?.load();

    match command {
        FlowsCommands::Show { model, os } => {
            let key = DeviceKey::new(model, os);
            show_assignment(&session, &key);
            return Ok(());
        }
        FlowsCommands::Toggle { model, os, flow } => {
            let key = DeviceKey::new(model, os);
            session.state.matrix.toggle_flow(&key, &flow, &catalog)?;
            show_assignment(&session, &key);
        }
        FlowsCommands::Reorder {
            model,
            os,
            from,
            to,
        } => {
            let key = DeviceKey::new(model, os);
            // The CLI surface is 1-based, matching the displayed list.
            if from == 0 || to == 0 {
                anyhow::bail!("Flow positions are 1-based");
            }
            session.state.matrix.reorder_flow(&key, from - 1, to - 1)?;
            show_assignment(&session, &key);
        }
        FlowsCommands::SelectAll { model, os } => {
            let key = DeviceKey::new(model, os);
            session
                .state
                .matrix
                .toggle_select_all_flows(&key, &catalog)?;
            show_assignment(&session, &key);
        }
    }

    session.save()
}

pub fn cmd_catalog(project_dir: &std::path::Path, command: Option<CatalogCommands>) -> Result<()> {
    let store = CatalogStore::open_default()?;
    let mut catalog = store.load();

    match command {
        None | Some(CatalogCommands::Show) => {
            println!("{}", console::style("Flow Catalog").bold());
            for (index, flow) in catalog.flows().iter().enumerate() {
                println!("  {}. {}", index + 1, flow);
            }
            if catalog == FlowCatalog::default() && !store.path().exists() {
                println!();
                println!("(defaults; edit with `deviceiq catalog add/rename/remove`)");
            }
            return Ok(());
        }
        Some(CatalogCommands::Add { name }) => {
            catalog.add(&name)?;
            store.save(&catalog)?;
            println!("Added flow '{}'", name.trim());
        }
        Some(CatalogCommands::Rename { old, new }) => {
            catalog.rename(&old, &new)?;
            store.save(&catalog)?;
            propagate_rename(project_dir, &old, new.trim())?;
            println!("Renamed flow '{}' to '{}'", old, new.trim());
        }
        Some(CatalogCommands::Remove { name }) => {
            catalog.remove(&name)?;
            store.save(&catalog)?;
            propagate_removal(project_dir, &name)?;
            println!("Removed flow '{}'", name);
        }
    }
    Ok(())
}

/// Keep session assignments inside the catalog after a removal.
fn propagate_removal(project_dir: &std::path::Path, flow: &str) -> Result<()> {
    if !Session::is_initialized(project_dir) {
        return Ok(());
    }
    let mut session = Session::open(project_dir)?;
    session.state.matrix.catalog_flow_removed(flow);
    session.save()
}

fn propagate_rename(project_dir: &std::path::Path, old: &str, new: &str) -> Result<()> {
    if !Session::is_initialized(project_dir) {
        return Ok(());
    }
    let mut session = Session::open(project_dir)?;
    session.state.matrix.catalog_flow_renamed(old, new);
    session.save()
}
