//! Coverage allocation: turn a ranked usage table into an inclusion decision
//! under a coverage threshold.
//!
//! The allocator is a pure function over its input. Output order is fully
//! deterministic even for unordered input: rows sort by usage descending,
//! with ties broken by device model then OS version, ascending lexicographic.

use tracing::debug;

use crate::device::{AllocatedDevice, DeviceUsageRecord, Summary};
use crate::errors::MatrixError;

/// Result of a single allocation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    /// Rank-ordered devices with cumulative coverage and inclusion flags.
    pub devices: Vec<AllocatedDevice>,
    pub summary: Summary,
}

/// Validate a coverage threshold into the `0..=100` percent range.
pub fn validate_threshold(value: f64) -> Result<f64, MatrixError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(MatrixError::InvalidThreshold { value })
    }
}

/// Run the allocation algorithm over `records` with coverage threshold
/// `threshold`.
///
/// Devices are included while the running coverage sum stays at or below the
/// threshold. The top-ranked device is always included, even when its own
/// usage alone exceeds the threshold, so a non-empty input always yields a
/// non-empty matrix.
pub fn allocate(records: &[DeviceUsageRecord], threshold: f64) -> Result<Allocation, MatrixError> {
    let threshold = validate_threshold(threshold)?;

    let mut ranked: Vec<DeviceUsageRecord> = records.to_vec();
    ranked.sort_by(|a, b| {
        b.usage_percent
            .partial_cmp(&a.usage_percent)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.device_model.cmp(&b.device_model))
            .then_with(|| a.os_version.cmp(&b.os_version))
    });

    let mut cumulative = 0.0;
    let mut devices = Vec::with_capacity(ranked.len());
    for (rank, record) in ranked.into_iter().enumerate() {
        cumulative += record.usage_percent;
        let include = cumulative <= threshold || rank == 0;
        devices.push(AllocatedDevice {
            device_model: record.device_model,
            os_version: record.os_version,
            usage_percent: record.usage_percent,
            cumulative_coverage: cumulative,
            include_in_matrix: include,
        });
    }

    let summary = summarize(&devices);
    debug!(
        threshold,
        total = summary.total_devices,
        included = summary.included_devices,
        "allocation complete"
    );
    Ok(Allocation { devices, summary })
}

/// Compute summary figures from an allocated sequence.
pub fn summarize(devices: &[AllocatedDevice]) -> Summary {
    Summary {
        total_devices: devices.len(),
        included_devices: devices.iter().filter(|d| d.include_in_matrix).count(),
        total_usage_percent: devices.iter().map(|d| d.usage_percent).sum(),
        covered_usage_percent: devices
            .iter()
            .filter(|d| d.include_in_matrix)
            .map(|d| d.usage_percent)
            .sum(),
    }
}
