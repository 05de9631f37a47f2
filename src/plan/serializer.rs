//! Plan artifact serialization.
//!
//! Two deterministic output formats:
//! - CSV with header `Device Model,OS Version,Test Flows`, flows joined with
//!   `|` inside one field. Fields are RFC-4180 quoted, so device models
//!   containing commas, quotes or the flow delimiter survive intact.
//! - JSON: an ordered array of `{device_model, os_version, flows}` objects.
//!
//! JSON is the canonical import format. Import is all-or-nothing: a
//! malformed artifact yields a single `ImportParse` error and no partial
//! state.

use tracing::debug;

use super::PlanEntry;
use crate::errors::PlanError;

/// Separator between flow names inside the CSV `Test Flows` field.
pub const FLOW_DELIMITER: char = '|';

const CSV_HEADER: [&str; 3] = ["Device Model", "OS Version", "Test Flows"];

/// Render plan entries as CSV.
pub fn entries_to_csv(entries: &[PlanEntry]) -> Result<String, PlanError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|e| PlanError::Serialize {
            reason: e.to_string(),
        })?;
    for entry in entries {
        let flows = entry.flows.join(&FLOW_DELIMITER.to_string());
        writer
            .write_record([&entry.device_model, &entry.os_version, &flows])
            .map_err(|e| PlanError::Serialize {
                reason: e.to_string(),
            })?;
    }
    let bytes = writer.into_inner().map_err(|e| PlanError::Serialize {
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| PlanError::Serialize {
        reason: e.to_string(),
    })
}

/// Parse a CSV artifact produced by [`entries_to_csv`].
pub fn parse_plan_csv(content: &str) -> Result<Vec<PlanEntry>, PlanError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers().map_err(|e| PlanError::ImportParse {
        reason: e.to_string(),
    })?;
    if headers.iter().ne(CSV_HEADER) {
        return Err(PlanError::ImportParse {
            reason: format!("unexpected CSV header: {:?}", headers),
        });
    }

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PlanError::ImportParse {
            reason: e.to_string(),
        })?;
        if record.len() != 3 {
            return Err(PlanError::ImportParse {
                reason: format!("expected 3 fields per row, got {}", record.len()),
            });
        }
        let flows = if record[2].is_empty() {
            Vec::new()
        } else {
            record[2]
                .split(FLOW_DELIMITER)
                .map(|f| f.to_string())
                .collect()
        };
        entries.push(PlanEntry {
            device_model: record[0].to_string(),
            os_version: record[1].to_string(),
            flows,
        });
    }
    Ok(entries)
}

/// Render plan entries as the canonical JSON artifact.
pub fn entries_to_json(entries: &[PlanEntry]) -> Result<String, PlanError> {
    serde_json::to_string_pretty(entries).map_err(|e| PlanError::Serialize {
        reason: e.to_string(),
    })
}

/// Parse a JSON artifact. Rejected wholesale on any malformation; existing
/// state is never touched by a failed import.
pub fn parse_plan_json(content: &str) -> Result<Vec<PlanEntry>, PlanError> {
    let entries: Vec<PlanEntry> =
        serde_json::from_str(content).map_err(|e| PlanError::ImportParse {
            reason: e.to_string(),
        })?;
    debug!(devices = entries.len(), "parsed plan artifact");
    Ok(entries)
}
