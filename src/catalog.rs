//! The flow catalog: the configurable universe of named test flows.
//!
//! Process-wide configuration with an explicit lifecycle: loaded once at
//! startup from `~/.deviceiq/flows.json`, saved on every mutation. An
//! absent or corrupt file falls back to the default catalog. The on-disk
//! format carries a version tag so future migrations have something to key
//! on.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Global configuration directory name under the user's home.
pub const GLOBAL_DEVICEIQ_DIR: &str = ".deviceiq";

/// File name of the persisted catalog inside the global directory.
pub const CATALOG_FILE: &str = "flows.json";

const CATALOG_FORMAT_VERSION: u32 = 1;

/// Flows every fresh install starts with.
pub const DEFAULT_FLOWS: [&str; 4] = ["LoginTest", "SearchTest", "AddToCartTest", "CheckoutTest"];

/// Ordered, duplicate-free list of flow names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowCatalog {
    flows: Vec<String>,
}

impl Default for FlowCatalog {
    fn default() -> Self {
        Self {
            flows: DEFAULT_FLOWS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl FlowCatalog {
    pub fn new(flows: Vec<String>) -> Self {
        let mut seen = std::collections::BTreeSet::new();
        let flows = flows
            .into_iter()
            .filter(|f| !f.trim().is_empty() && seen.insert(f.clone()))
            .collect();
        Self { flows }
    }

    pub fn flows(&self) -> &[String] {
        &self.flows
    }

    pub fn contains(&self, flow: &str) -> bool {
        self.flows.iter().any(|f| f == flow)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Append a new flow. The name is trimmed; empty and duplicate names
    /// are rejected.
    pub fn add(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Flow name cannot be empty");
        }
        if self.contains(name) {
            bail!("Flow '{}' already exists in the catalog", name);
        }
        self.flows.push(name.to_string());
        Ok(())
    }

    /// Rename a flow in place, keeping its catalog position.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        let new = new.trim();
        if new.is_empty() {
            bail!("Flow name cannot be empty");
        }
        if old != new && self.contains(new) {
            bail!("Flow '{}' already exists in the catalog", new);
        }
        match self.flows.iter_mut().find(|f| f.as_str() == old) {
            Some(slot) => {
                *slot = new.to_string();
                Ok(())
            }
            None => bail!("Flow '{}' is not in the catalog", old),
        }
    }

    /// Remove a flow. Callers are responsible for stripping it from any
    /// flow assignments to keep the subset invariant.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let before = self.flows.len();
        self.flows.retain(|f| f != name);
        if self.flows.len() == before {
            bail!("Flow '{}' is not in the catalog", name);
        }
        Ok(())
    }
}

/// Versioned on-disk envelope.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    version: u32,
    flows: Vec<String>,
}

/// Resolve the global deviceiq directory.
///
/// `DEVICEIQ_HOME` overrides the default `~/.deviceiq` (used by tests and
/// sandboxed environments).
pub fn global_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DEVICEIQ_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(GLOBAL_DEVICEIQ_DIR))
}

/// Load-at-start / save-on-change store for the flow catalog.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Store under the global deviceiq directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(global_dir()?.join(CATALOG_FILE)))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog, falling back to the defaults when the file is
    /// absent or unreadable.
    pub fn load(&self) -> FlowCatalog {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return FlowCatalog::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read flow catalog; using defaults");
                return FlowCatalog::default();
            }
        };
        match serde_json::from_str::<CatalogFile>(&content) {
            Ok(file) if file.version == CATALOG_FORMAT_VERSION => FlowCatalog::new(file.flows),
            Ok(file) => {
                warn!(
                    version = file.version,
                    "unsupported flow catalog version; using defaults"
                );
                FlowCatalog::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt flow catalog; using defaults");
                FlowCatalog::default()
            }
        }
    }

    /// Persist the catalog. Called after every mutation.
    pub fn save(&self, catalog: &FlowCatalog) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = CatalogFile {
            version: CATALOG_FORMAT_VERSION,
            flows: catalog.flows.clone(),
        };
        let json = serde_json::to_string_pretty(&file).context("Failed to serialize catalog")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write catalog to {}", self.path.display()))
    }
}
