//! Execution status tracking per (device, flow) pair.
//!
//! A labeling map, not an enforced state machine: any status may be replaced
//! by any other via an explicit update, and no transition is rejected.
//! Entries are never removed automatically (not by toggling a flow off, not
//! by excluding a device), so a device that re-enters the matrix under the
//! same key gets its statuses back verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::device::{DeviceKey, ExecutionStatus};

/// DeviceKey -> (flow name -> last-known status).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusBoard {
    statuses: BTreeMap<DeviceKey, BTreeMap<String, ExecutionStatus>>,
}

impl StatusBoard {
    /// Look up the status for a pair; unobserved pairs are `Pending`.
    pub fn get(&self, key: &DeviceKey, flow: &str) -> ExecutionStatus {
        self.statuses
            .get(key)
            .and_then(|flows| flows.get(flow))
            .copied()
            .unwrap_or_default()
    }

    /// Record a status. Overwrites whatever label was there before.
    pub fn set(&mut self, key: DeviceKey, flow: impl Into<String>, status: ExecutionStatus) {
        self.statuses
            .entry(key)
            .or_default()
            .insert(flow.into(), status);
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&DeviceKey, &BTreeMap<String, ExecutionStatus>)> {
        self.statuses.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Drop every entry. Only session reset and plan loading do this.
    pub fn clear(&mut self) {
        self.statuses.clear();
    }
}
