//! Session persistence.
//!
//! The engine operates over a single-session working set. For the CLI that
//! working set lives in `.deviceiq/session.json` inside the project
//! directory: every command loads it, applies one transition, and writes it
//! back. The file carries a version tag; a corrupt file is a hard error
//! rather than a silent reset (`deviceiq reset` discards it explicitly).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matrix::MatrixState;
use crate::plan::PlanLibrary;

/// Per-project state directory.
pub const SESSION_DIR: &str = ".deviceiq";

/// Session state file inside [`SESSION_DIR`].
pub const SESSION_FILE: &str = "session.json";

const SESSION_FORMAT_VERSION: u32 = 1;

/// Everything a session owns: the matrix aggregate and the plan library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub matrix: MatrixState,
    pub library: PlanLibrary,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    state: SessionState,
}

/// A loaded session bound to its on-disk location.
#[derive(Debug)]
pub struct Session {
    dir: PathBuf,
    pub state: SessionState,
}

impl Session {
    pub fn dir_for(project_dir: &Path) -> PathBuf {
        project_dir.join(SESSION_DIR)
    }

    pub fn is_initialized(project_dir: &Path) -> bool {
        Self::dir_for(project_dir).is_dir()
    }

    /// Create the session directory. Idempotent.
    pub fn init(project_dir: &Path) -> Result<Self> {
        let dir = Self::dir_for(project_dir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        Ok(Self {
            dir,
            state: SessionState::default(),
        })
    }

    /// Open an initialized session. A missing state file yields the default
    /// state; an unreadable or unparsable one is an error.
    pub fn open(project_dir: &Path) -> Result<Self> {
        let dir = Self::dir_for(project_dir);
        if !dir.is_dir() {
            bail!("Not initialized. Run 'deviceiq init' first.");
        }
        let path = dir.join(SESSION_FILE);
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let file: SessionFile = serde_json::from_str(&content)
                    .with_context(|| format!("Corrupt session file at {}", path.display()))?;
                if file.version != SESSION_FORMAT_VERSION {
                    bail!(
                        "Unsupported session format version {} at {}",
                        file.version,
                        path.display()
                    );
                }
                file.state
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionState::default(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read session file at {}", path.display()));
            }
        };
        debug!(dir = %dir.display(), "opened session");
        Ok(Self { dir, state })
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Write the session state back to disk.
    pub fn save(&self) -> Result<()> {
        let file = SessionFile {
            version: SESSION_FORMAT_VERSION,
            state: self.state.clone(),
        };
        let json =
            serde_json::to_string_pretty(&file).context("Failed to serialize session state")?;
        let path = self.state_path();
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write session file at {}", path.display()))
    }

    /// Discard the persisted state, leaving the directory in place.
    pub fn reset(project_dir: &Path) -> Result<()> {
        let path = Self::dir_for(project_dir).join(SESSION_FILE);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session file at {}", path.display())),
        }
    }
}
