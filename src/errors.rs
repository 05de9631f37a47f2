//! Typed error hierarchy for the deviceiq engine.
//!
//! Three top-level enums cover the three subsystems:
//! - `ApiError` — outbound requests to the usage-aggregation service
//! - `PlanError` — plan artifact import/export and library operations
//! - `MatrixError` — working-matrix state transitions
//!
//! None of these are fatal: the engine remains usable after any failure and
//! all recovery is user-initiated re-submission.

use thiserror::Error;

use crate::device::DeviceKey;

/// Errors from the outbound aggregation-service requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response; `detail` is the server-provided message when the
    /// body carried one, otherwise a generic fallback.
    #[error("Request failed ({status}): {detail}")]
    RequestFailed { status: u16, detail: String },

    /// Transport-level failure (DNS, connect, TLS, body read).
    #[error("Failed to fetch: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Failed to read upload file at {path}: {source}")]
    UploadReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from plan serialization and the plan library.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The artifact was rejected wholesale; no partial import happens.
    #[error("Failed to parse plan artifact: {reason}")]
    ImportParse { reason: String },

    #[error("Plan {id} not found")]
    PlanNotFound { id: String },

    #[error("Failed to serialize plan: {reason}")]
    Serialize { reason: String },

    #[error("Failed to write plan export: {0}")]
    ExportWrite(#[source] std::io::Error),
}

/// Errors from working-matrix state transitions.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("Coverage threshold {value} is out of range (expected 0-100)")]
    InvalidThreshold { value: f64 },

    #[error("Cannot pin {key}: device is currently excluded")]
    PinRejected { key: DeviceKey },

    #[error("Cannot edit flows for {key}: device is currently excluded")]
    DeviceExcluded { key: DeviceKey },

    #[error("Device {key} is not in the working matrix")]
    DeviceNotFound { key: DeviceKey },

    #[error("Flow '{flow}' is not in the catalog")]
    UnknownFlow { flow: String },

    #[error("Reorder indices {from} -> {to} out of bounds for {len} flows")]
    InvalidReorder { from: usize, to: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_request_failed_carries_detail() {
        let err = ApiError::RequestFailed {
            status: 422,
            detail: "missing column usage_percent".to_string(),
        };
        match &err {
            ApiError::RequestFailed { status, detail } => {
                assert_eq!(*status, 422);
                assert!(detail.contains("usage_percent"));
            }
            _ => panic!("Expected RequestFailed variant"),
        }
        assert!(err.to_string().contains("422"));
    }

    #[test]
    fn plan_error_import_parse_carries_reason() {
        let err = PlanError::ImportParse {
            reason: "expected an array".to_string(),
        };
        match &err {
            PlanError::ImportParse { reason } => assert_eq!(reason, "expected an array"),
            _ => panic!("Expected ImportParse"),
        }
    }

    #[test]
    fn matrix_error_pin_rejected_names_the_device() {
        let err = MatrixError::PinRejected {
            key: DeviceKey::new("Pixel 8", "14"),
        };
        assert!(err.to_string().contains("Pixel 8"));
        assert!(matches!(err, MatrixError::PinRejected { .. }));
    }

    #[test]
    fn matrix_error_invalid_reorder_carries_indices() {
        let err = MatrixError::InvalidReorder {
            from: 5,
            to: 0,
            len: 3,
        };
        match err {
            MatrixError::InvalidReorder { from, to, len } => {
                assert_eq!((from, to, len), (5, 0, 3));
            }
            _ => panic!("Expected InvalidReorder"),
        }
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&PlanError::PlanNotFound { id: "x".into() });
        assert_std_error(&MatrixError::InvalidThreshold { value: 101.0 });
        assert_std_error(&ApiError::RequestFailed {
            status: 500,
            detail: "boom".into(),
        });
    }
}
