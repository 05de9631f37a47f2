//! Matrix generation and analytics commands.
//!
//! Both upload the usage file to the aggregation service. `generate` can
//! also run fully offline with `--local`, parsing the usage table itself
//! and running the in-process allocator.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use deviceiq::allocator::Allocation;
use deviceiq::api::AggregationClient;
use deviceiq::catalog::CatalogStore;
use deviceiq::device::{DeviceUsageRecord, GroupBy};
use deviceiq::session::Session;

/// Default service endpoint; override with `--service-url` or
/// `DEVICEIQ_SERVICE_URL`.
const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

fn service_url(flag: Option<&str>) -> String {
    flag.map(|s| s.to_string())
        .or_else(|| std::env::var("DEVICEIQ_SERVICE_URL").ok())
        .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string())
}

fn api_key() -> String {
    std::env::var("DEVICEIQ_API_KEY").unwrap_or_default()
}

fn parse_group_by(flag: Option<&str>) -> Result<Option<GroupBy>> {
    flag.map(|g| g.parse::<GroupBy>().map_err(|e| anyhow!(e)))
        .transpose()
}

/// Read a raw usage table: CSV with a `device_model,os_version,usage_percent`
/// header. Only used by `--local`; the service does its own parsing.
fn read_usage_csv(path: &Path) -> Result<Vec<DeviceUsageRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open usage file at {}", path.display()))?;
    let mut records = Vec::new();
    for row in reader.deserialize::<DeviceUsageRecord>() {
        records.push(row.context("Failed to parse usage row")?);
    }
    Ok(records)
}

pub async fn cmd_generate(
    project_dir: &Path,
    file: &Path,
    threshold: f64,
    group_by: Option<&str>,
    service_url_flag: Option<&str>,
    local: bool,
) -> Result<()> {
    let group_by = parse_group_by(group_by)?;
    let mut session = Session::open(project_dir)?;
    let catalog = CatalogStore::open_default()?.load();

    let allocation = if local {
        if group_by.is_some() {
            anyhow::bail!("--group-by requires the aggregation service; drop --local");
        }
        let records = read_usage_csv(file)?;
        deviceiq::allocator::allocate(&records, threshold)?
    } else {
        let client = AggregationClient::new(service_url(service_url_flag), api_key());
        let response = client.generate_matrix(file, threshold, group_by).await?;
        match response {
            Some(body) => Allocation {
                devices: body.matrix,
                summary: body.summary,
            },
            None => {
                // Superseded by a newer request; that one owns the state now.
                println!("A newer matrix request finished first; nothing applied.");
                return Ok(());
            }
        }
    };

    session
        .state
        .matrix
        .apply_allocation(allocation, threshold, &catalog)?;
    session.save()?;

    super::project::cmd_matrix(project_dir)
}

pub async fn cmd_analytics(
    file: &Path,
    group_by: Option<&str>,
    service_url_flag: Option<&str>,
) -> Result<()> {
    let group_by = parse_group_by(group_by)?;
    let client = AggregationClient::new(service_url(service_url_flag), api_key());
    let response = client.fetch_analytics(file, group_by).await?;

    let Some(body) = response else {
        println!("A newer analytics request finished first; nothing to show.");
        return Ok(());
    };

    print_section("Usage Distribution", &body.usage_distribution);
    print_section("Cumulative Curve", &body.cumulative_curve);
    print_section("OS Version Breakdown", &body.os_version_breakdown);
    Ok(())
}

fn print_section(title: &str, rows: &[serde_json::Value]) {
    println!();
    println!("{}", console::style(title).bold());
    if rows.is_empty() {
        println!("  (no data)");
        return;
    }
    for row in rows {
        match row.as_object() {
            Some(fields) => {
                let line: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                println!("  {}", line.join("  "));
            }
            None => println!("  {}", row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_usage_csv_parses_the_standard_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "device_model,os_version,usage_percent").unwrap();
        writeln!(file, "Pixel 8,14,40.5").unwrap();
        writeln!(file, "\"Galaxy Tab, A9\",13,12.25").unwrap();
        let records = read_usage_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].device_model, "Pixel 8");
        assert_eq!(records[1].device_model, "Galaxy Tab, A9");
        assert_eq!(records[1].usage_percent, 12.25);
    }

    #[test]
    fn read_usage_csv_rejects_malformed_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "device_model,os_version,usage_percent").unwrap();
        writeln!(file, "Pixel 8,14,not-a-number").unwrap();
        assert!(read_usage_csv(file.path()).is_err());
    }

    #[test]
    fn service_url_prefers_the_flag() {
        assert_eq!(service_url(Some("http://svc:9000")), "http://svc:9000");
    }

    #[test]
    fn parse_group_by_accepts_known_keys() {
        assert_eq!(
            parse_group_by(Some("os_version")).unwrap(),
            Some(GroupBy::OsVersion)
        );
        assert_eq!(parse_group_by(None).unwrap(), None);
        assert!(parse_group_by(Some("bogus")).is_err());
    }
}
