//! The matrix state aggregate.
//!
//! Allocation output, operator overrides, flow assignments and execution
//! statuses co-evolve under overlapping triggers, so they live in one
//! aggregate with named transitions instead of scattered slices. Every
//! mutation goes through a method here, which keeps the cross-slice
//! invariants (assignment seeding, subset-of-catalog, status retention)
//! checkable in one place.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::allocator::{self, Allocation};
use crate::catalog::FlowCatalog;
use crate::device::{AllocatedDevice, DeviceKey, DeviceUsageRecord, ExecutionStatus, Summary};
use crate::errors::MatrixError;
use crate::flows::FlowAssignments;
use crate::overrides::{OverrideSet, reconcile};
use crate::plan::PlanEntry;
use crate::status::StatusBoard;

/// Coverage threshold applied when none has been chosen yet.
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 80.0;

/// Single owner of the session's working state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixState {
    threshold: f64,
    allocation: Vec<AllocatedDevice>,
    overrides: OverrideSet,
    assignments: FlowAssignments,
    statuses: StatusBoard,
}

impl Default for MatrixState {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COVERAGE_THRESHOLD,
            allocation: Vec::new(),
            overrides: OverrideSet::default(),
            assignments: FlowAssignments::default(),
            statuses: StatusBoard::default(),
        }
    }
}

impl MatrixState {
    /// Run the local allocator over raw usage rows and apply the result.
    pub fn allocate(
        &mut self,
        records: &[DeviceUsageRecord],
        threshold: f64,
        catalog: &FlowCatalog,
    ) -> Result<(), MatrixError> {
        let allocation = allocator::allocate(records, threshold)?;
        self.apply_allocation(allocation, threshold, catalog)
    }

    /// Replace the allocation wholesale, e.g. with the aggregation
    /// service's response.
    ///
    /// The override set and the status board persist across allocation
    /// runs; flow assignments are reset and reseeded from the catalog for
    /// every device in the new working matrix.
    pub fn apply_allocation(
        &mut self,
        allocation: Allocation,
        threshold: f64,
        catalog: &FlowCatalog,
    ) -> Result<(), MatrixError> {
        self.threshold = allocator::validate_threshold(threshold)?;
        self.allocation = allocation.devices;
        self.assignments.clear();
        self.seed_missing_assignments(catalog);
        info!(
            devices = self.allocation.len(),
            working = self.working_matrix().len(),
            "applied allocation"
        );
        Ok(())
    }

    /// Force a device into the working matrix. Rejected while the device is
    /// excluded.
    pub fn pin(&mut self, key: DeviceKey, catalog: &FlowCatalog) -> Result<(), MatrixError> {
        self.overrides.pin(key)?;
        self.seed_missing_assignments(catalog);
        Ok(())
    }

    pub fn unpin(&mut self, key: &DeviceKey) {
        self.overrides.unpin(key);
    }

    /// Remove a device from the working matrix. Its flow assignment and
    /// statuses are preserved; a pre-existing pin still wins at assembly.
    pub fn exclude(&mut self, key: DeviceKey) {
        self.overrides.exclude(key);
    }

    pub fn unexclude(&mut self, key: &DeviceKey, catalog: &FlowCatalog) {
        self.overrides.unexclude(key);
        self.seed_missing_assignments(catalog);
    }

    /// Toggle one flow for a device. Excluded devices are read-only.
    pub fn toggle_flow(
        &mut self,
        key: &DeviceKey,
        flow: &str,
        catalog: &FlowCatalog,
    ) -> Result<(), MatrixError> {
        self.ensure_editable(key)?;
        self.assignments.toggle(key, flow, catalog)
    }

    /// Move a flow within a device's execution order.
    pub fn reorder_flow(
        &mut self,
        key: &DeviceKey,
        from: usize,
        to: usize,
    ) -> Result<(), MatrixError> {
        self.ensure_editable(key)?;
        self.assignments.reorder(key, from, to)
    }

    /// Select-all / deselect-all toggle for a device's flows.
    pub fn toggle_select_all_flows(
        &mut self,
        key: &DeviceKey,
        catalog: &FlowCatalog,
    ) -> Result<(), MatrixError> {
        self.ensure_editable(key)?;
        self.assignments.toggle_select_all(key, catalog)
    }

    /// Record an execution status. Always permitted: statuses are labels,
    /// and they outlive flow toggles and exclusions.
    pub fn set_status(&mut self, key: DeviceKey, flow: impl Into<String>, status: ExecutionStatus) {
        self.statuses.set(key, flow, status);
    }

    pub fn status(&self, key: &DeviceKey, flow: &str) -> ExecutionStatus {
        self.statuses.get(key, flow)
    }

    /// Propagate a catalog flow removal into every assignment, keeping the
    /// subset invariant. Statuses for the removed flow are retained.
    pub fn catalog_flow_removed(&mut self, flow: &str) {
        self.assignments.remove_flow_everywhere(flow);
    }

    /// Propagate a catalog flow rename into every assignment. Statuses keep
    /// the old label; they are never rewritten behind the operator's back.
    pub fn catalog_flow_renamed(&mut self, old: &str, new: &str) {
        self.assignments.rename_flow_everywhere(old, new);
    }

    /// Replace the working matrix and flow assignments wholesale from a
    /// saved plan. Overrides, threshold and the status board reset to
    /// defaults; usage figures are not part of the plan format and default
    /// to zero.
    pub fn load_plan(&mut self, entries: &[PlanEntry]) {
        self.allocation = entries
            .iter()
            .map(|entry| AllocatedDevice {
                device_model: entry.device_model.clone(),
                os_version: entry.os_version.clone(),
                usage_percent: 0.0,
                cumulative_coverage: 0.0,
                include_in_matrix: true,
            })
            .collect();
        self.overrides.clear();
        self.threshold = DEFAULT_COVERAGE_THRESHOLD;
        self.statuses.clear();
        self.assignments.replace(
            entries
                .iter()
                .map(|entry| (entry.key(), entry.flows.clone()))
                .collect(),
        );
        info!(devices = entries.len(), "loaded plan into working set");
    }

    /// Drop all session state back to defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// The post-override matrix: pinned devices first in rank order, then
    /// the threshold-admitted, non-excluded remainder.
    pub fn working_matrix(&self) -> Vec<AllocatedDevice> {
        reconcile(&self.allocation, &self.overrides)
    }

    /// Summary over the current working matrix. `covered_usage_percent` is
    /// the usage sum of the devices actually present post-override.
    pub fn summary(&self) -> Summary {
        let working = self.working_matrix();
        Summary {
            total_devices: self.allocation.len(),
            included_devices: working.len(),
            total_usage_percent: self.allocation.iter().map(|d| d.usage_percent).sum(),
            covered_usage_percent: working.iter().map(|d| d.usage_percent).sum(),
        }
    }

    /// Snapshot the working matrix and its flow assignments as plan entries.
    pub fn plan_entries(&self) -> Vec<PlanEntry> {
        self.working_matrix()
            .iter()
            .map(|device| {
                let key = device.key();
                PlanEntry {
                    device_model: device.device_model.clone(),
                    os_version: device.os_version.clone(),
                    flows: self
                        .assignments
                        .get(&key)
                        .map(|flows| flows.to_vec())
                        .unwrap_or_default(),
                }
            })
            .collect()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn allocation(&self) -> &[AllocatedDevice] {
        &self.allocation
    }

    pub fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }

    pub fn assignments(&self) -> &FlowAssignments {
        &self.assignments
    }

    pub fn statuses(&self) -> &StatusBoard {
        &self.statuses
    }

    pub fn is_empty(&self) -> bool {
        self.allocation.is_empty()
    }

    fn ensure_editable(&self, key: &DeviceKey) -> Result<(), MatrixError> {
        if self.overrides.is_excluded(key) {
            return Err(MatrixError::DeviceExcluded { key: key.clone() });
        }
        Ok(())
    }

    /// Seed the full catalog for any working-matrix device that has no
    /// assignment yet. Existing assignments (including those of excluded
    /// devices) are left alone.
    fn seed_missing_assignments(&mut self, catalog: &FlowCatalog) {
        for device in self.working_matrix() {
            let key = device.key();
            if self.assignments.get(&key).is_none() {
                debug!(%key, "seeding flow assignment");
                self.assignments.seed(key, catalog);
            }
        }
    }
}
