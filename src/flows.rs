//! Per-device ordered flow assignments.
//!
//! Each device in the working matrix carries an ordered list of enabled test
//! flows, seeded with the full catalog when the device enters the matrix.
//! Assignment lists are always duplicate-free subsets of the current catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::FlowCatalog;
use crate::device::DeviceKey;
use crate::errors::MatrixError;

/// Remove the element at `from` and reinsert it at `to`.
///
/// A pure splice: no duplication, no loss, for any in-bounds index pair.
/// Used for manual execution-sequence curation.
pub fn reorder<T: Clone>(list: &[T], from: usize, to: usize) -> Result<Vec<T>, MatrixError> {
    if from >= list.len() || to >= list.len() {
        return Err(MatrixError::InvalidReorder {
            from,
            to,
            len: list.len(),
        });
    }
    let mut out = list.to_vec();
    let item = out.remove(from);
    out.insert(to, item);
    Ok(out)
}

/// DeviceKey -> ordered flow list for every device in the working matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowAssignments {
    assignments: BTreeMap<DeviceKey, Vec<String>>,
}

impl FlowAssignments {
    /// Seed `key` with the full catalog in catalog order. Called when a
    /// device enters the working matrix; overwrites any previous list.
    pub fn seed(&mut self, key: DeviceKey, catalog: &FlowCatalog) {
        self.assignments.insert(key, catalog.flows().to_vec());
    }

    /// Replace the whole store, e.g. when loading a saved plan.
    pub fn replace(&mut self, assignments: BTreeMap<DeviceKey, Vec<String>>) {
        self.assignments = assignments;
    }

    pub fn get(&self, key: &DeviceKey) -> Option<&[String]> {
        self.assignments.get(key).map(|v| v.as_slice())
    }

    pub fn remove(&mut self, key: &DeviceKey) {
        self.assignments.remove(key);
    }

    pub fn clear(&mut self) {
        self.assignments.clear();
    }

    /// Toggle `flow` for `key`: remove it if present (order of the rest is
    /// preserved), otherwise append it at the end. Toggling a flow off and
    /// back on therefore moves it to the end rather than restoring its
    /// original catalog position.
    pub fn toggle(
        &mut self,
        key: &DeviceKey,
        flow: &str,
        catalog: &FlowCatalog,
    ) -> Result<(), MatrixError> {
        if !catalog.contains(flow) {
            return Err(MatrixError::UnknownFlow {
                flow: flow.to_string(),
            });
        }
        let list = self
            .assignments
            .get_mut(key)
            .ok_or_else(|| MatrixError::DeviceNotFound { key: key.clone() })?;
        if let Some(pos) = list.iter().position(|f| f == flow) {
            list.remove(pos);
        } else {
            list.push(flow.to_string());
        }
        Ok(())
    }

    /// Reorder the assignment for `key` by moving `from` to `to`.
    pub fn reorder(&mut self, key: &DeviceKey, from: usize, to: usize) -> Result<(), MatrixError> {
        let list = self
            .assignments
            .get_mut(key)
            .ok_or_else(|| MatrixError::DeviceNotFound { key: key.clone() })?;
        *list = reorder(list, from, to)?;
        Ok(())
    }

    /// Set the assignment to the full catalog in catalog order.
    pub fn select_all(&mut self, key: &DeviceKey, catalog: &FlowCatalog) -> Result<(), MatrixError> {
        let list = self
            .assignments
            .get_mut(key)
            .ok_or_else(|| MatrixError::DeviceNotFound { key: key.clone() })?;
        *list = catalog.flows().to_vec();
        Ok(())
    }

    /// Empty the assignment.
    pub fn deselect_all(&mut self, key: &DeviceKey) -> Result<(), MatrixError> {
        let list = self
            .assignments
            .get_mut(key)
            .ok_or_else(|| MatrixError::DeviceNotFound { key: key.clone() })?;
        list.clear();
        Ok(())
    }

    /// The single-toggle surface: deselect everything when the assignment
    /// already covers the full catalog, otherwise select everything.
    pub fn toggle_select_all(
        &mut self,
        key: &DeviceKey,
        catalog: &FlowCatalog,
    ) -> Result<(), MatrixError> {
        let full = self
            .get(key)
            .map(|flows| flows.len() == catalog.len())
            .ok_or_else(|| MatrixError::DeviceNotFound { key: key.clone() })?;
        if full {
            self.deselect_all(key)
        } else {
            self.select_all(key, catalog)
        }
    }

    /// Strip a flow from every assignment. Used when the flow is removed
    /// from the catalog, keeping the subset invariant.
    pub fn remove_flow_everywhere(&mut self, flow: &str) {
        for list in self.assignments.values_mut() {
            list.retain(|f| f != flow);
        }
    }

    /// Rename a flow in every assignment, keeping each list's order.
    pub fn rename_flow_everywhere(&mut self, old: &str, new: &str) {
        for list in self.assignments.values_mut() {
            for slot in list.iter_mut() {
                if slot == old {
                    *slot = new.to_string();
                }
            }
        }
    }
}
