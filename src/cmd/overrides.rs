//! Pin and exclude commands.

use anyhow::Result;

use deviceiq::catalog::CatalogStore;
use deviceiq::device::DeviceKey;
use deviceiq::session::Session;

pub fn cmd_pin(project_dir: &std::path::Path, model: &str, os: &str) -> Result<()> {
    let mut session = Session::open(project_dir)?;
    let catalog = CatalogStore::open_default()?.load();
    let key = DeviceKey::new(model, os);
    session.state.matrix.pin(key.clone(), &catalog)?;
    session.save()?;
    println!("Pinned {}", key);
    Ok(())
}

pub fn cmd_unpin(project_dir: &std::path::Path, model: &str, os: &str) -> Result<()> {
    let mut session = Session::open(project_dir)?;
    let key = DeviceKey::new(model, os);
    session.state.matrix.unpin(&key);
    session.save()?;
    println!("Unpinned {}", key);
    Ok(())
}

pub fn cmd_exclude(project_dir: &std::path::Path, model: &str, os: &str) -> Result<()> {
    let mut session = Session::open(project_dir)?;
    let key = DeviceKey::new(model, os);
    let pinned = session.state.matrix.overrides().is_pinned(&key);
    session.state.matrix.exclude(key.clone());
    session.save()?;
    println!("Excluded {}", key);
    if pinned {
        println!(
            "{}",
            console::style("Note: this device is pinned; the pin keeps it in the matrix.")
                .yellow()
        );
    }
    Ok(())
}

pub fn cmd_unexclude(project_dir: &std::path::Path, model: &str, os: &str) -> Result<()> {
    let mut session = Session::open(project_dir)?;
    let catalog = CatalogStore::open_default()?.load();
    let key = DeviceKey::new(model, os);
    session.state.matrix.unexclude(&key, &catalog);
    session.save()?;
    println!("Unexcluded {}", key);
    Ok(())
}
