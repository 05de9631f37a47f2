//! Core domain types for the device coverage matrix.
//!
//! Everything downstream (allocation, overrides, flow assignment, plans)
//! is keyed by [`DeviceKey`], a structured pair of model and OS version.
//! The key is deliberately not a delimiter-joined string: device models and
//! OS versions can themselves contain any separator we might pick.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Composite identity of a device+OS combination.
///
/// Used as the map key for overrides, flow assignments and execution
/// statuses. `Ord` gives stable iteration order wherever sets of keys are
/// rendered or serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceKey {
    pub device_model: String,
    pub os_version: String,
}

impl DeviceKey {
    pub fn new(device_model: impl Into<String>, os_version: impl Into<String>) -> Self {
        Self {
            device_model: device_model.into(),
            os_version: os_version.into(),
        }
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.device_model, self.os_version)
    }
}

/// A single raw usage row as produced by the ingestion service.
///
/// `usage_percent` values are independent measurements and need not sum
/// to 100 across a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceUsageRecord {
    pub device_model: String,
    pub os_version: String,
    pub usage_percent: f64,
}

impl DeviceUsageRecord {
    pub fn key(&self) -> DeviceKey {
        DeviceKey::new(&self.device_model, &self.os_version)
    }
}

/// A usage record after an allocation run: rank-ordered, annotated with the
/// running coverage sum and the threshold decision.
///
/// Allocated devices are recomputed wholesale on every allocation run and
/// never mutated incrementally. The flat field layout matches the
/// aggregation service's `matrix` response element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatedDevice {
    pub device_model: String,
    pub os_version: String,
    pub usage_percent: f64,
    pub cumulative_coverage: f64,
    pub include_in_matrix: bool,
}

impl AllocatedDevice {
    pub fn key(&self) -> DeviceKey {
        DeviceKey::new(&self.device_model, &self.os_version)
    }
}

/// Aggregate figures for an allocation run, recomputed whenever the working
/// matrix or the override set changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_devices: usize,
    pub included_devices: usize,
    pub total_usage_percent: f64,
    pub covered_usage_percent: f64,
}

/// Last-known outcome label for a (device, flow) pair.
///
/// This is a labeling map, not an enforced state machine: any status may be
/// overwritten with any other by an explicit update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    #[default]
    Pending,
    Running,
    Passed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!(
                "Invalid status '{}'. Valid values: pending, running, passed, failed",
                s
            )),
        }
    }
}

/// Grouping key accepted by the aggregation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    DeviceModel,
    OsVersion,
    OsMajorVersion,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceModel => "device_model",
            Self::OsVersion => "os_version",
            Self::OsMajorVersion => "os_major_version",
        }
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "device_model" => Ok(Self::DeviceModel),
            "os_version" => Ok(Self::OsVersion),
            "os_major_version" => Ok(Self::OsMajorVersion),
            _ => Err(format!(
                "Invalid group-by key '{}'. Valid values: device_model, os_version, os_major_version",
                s
            )),
        }
    }
}
