//! Saved test plans: portable snapshots of the working matrix plus its flow
//! assignments.
//!
//! | Submodule    | What it owns                                      |
//! |--------------|---------------------------------------------------|
//! | `serializer` | CSV/JSON export, JSON import, round-trip contract |
//! | `library`    | Named SavedPlan collection (CRUD + selection)     |

pub mod library;
pub mod serializer;

pub use library::PlanLibrary;
pub use serializer::{
    FLOW_DELIMITER, entries_to_csv, entries_to_json, parse_plan_csv, parse_plan_json,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::DeviceKey;

/// One device row inside a plan artifact. Flow order is significant and is
/// preserved exactly through export and import.
///
/// Note what is *not* here: `usage_percent`. The plan format is intentionally
/// lossy about usage figures; loading a plan back into the working set
/// defaults them to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub device_model: String,
    pub os_version: String,
    #[serde(default)]
    pub flows: Vec<String>,
}

impl PlanEntry {
    pub fn key(&self) -> DeviceKey {
        DeviceKey::new(&self.device_model, &self.os_version)
    }
}

/// An immutable named snapshot held in the plan library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlan {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub data: Vec<PlanEntry>,
}
