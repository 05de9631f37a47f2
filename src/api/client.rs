//! HTTP client for the usage-aggregation service.
//!
//! Two endpoints, one per operation channel:
//! - `POST /upload-csv/` — matrix generation (query: `coverage_threshold`,
//!   optional `group_by`)
//! - `POST /analytics/` — presentation aggregates (query: optional
//!   `group_by`)
//!
//! Both take the usage file as a multipart upload and authenticate with a
//! static API-key header. The two channels surface errors independently and
//! never clobber each other's state.
//!
//! Responses race: a second submission issued before the first resolves
//! would otherwise let whichever lands last overwrite state. Each channel
//! therefore stamps requests from a monotonic counter and discards any
//! response that is no longer the newest in-flight request.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::device::{AllocatedDevice, GroupBy, Summary};
use crate::errors::ApiError;

/// Header carrying the static service credential.
pub const API_KEY_HEADER: &str = "X-API-Key";

const MATRIX_PATH: &str = "upload-csv/";
const ANALYTICS_PATH: &str = "analytics/";

/// Matrix-generation response body.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixResponse {
    pub matrix: Vec<AllocatedDevice>,
    pub summary: Summary,
}

/// Analytics response body. The arrays are opaque labeled records, passed
/// through for presentation only.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsResponse {
    #[serde(default)]
    pub usage_distribution: Vec<serde_json::Value>,
    #[serde(default)]
    pub cumulative_curve: Vec<serde_json::Value>,
    #[serde(default)]
    pub os_version_breakdown: Vec<serde_json::Value>,
}

/// Error body shape the service uses for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Monotonic request identifiers for one operation channel.
///
/// `begin` issues a fresh id and makes it the newest; `is_current` tells a
/// resolved request whether it still is. Stale responses must be dropped by
/// the caller.
#[derive(Debug, Default)]
pub struct RequestChannel {
    counter: AtomicU64,
    latest: AtomicU64,
}

impl RequestChannel {
    pub fn begin(&self) -> u64 {
        let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest.store(id, Ordering::SeqCst);
        id
    }

    pub fn is_current(&self, id: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == id
    }
}

/// Client over both aggregation-service endpoints.
#[derive(Debug)]
pub struct AggregationClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    matrix_channel: RequestChannel,
    analytics_channel: RequestChannel,
}

impl AggregationClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
            matrix_channel: RequestChannel::default(),
            analytics_channel: RequestChannel::default(),
        }
    }

    /// Upload a usage file and request a generated matrix.
    ///
    /// Returns `Ok(None)` when the response was superseded by a newer
    /// request on the matrix channel.
    pub async fn generate_matrix(
        &self,
        file_path: &Path,
        coverage_threshold: f64,
        group_by: Option<GroupBy>,
    ) -> Result<Option<MatrixResponse>, ApiError> {
        let ticket = self.matrix_channel.begin();
        let form = self.upload_form(file_path)?;

        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, MATRIX_PATH))
            .header(API_KEY_HEADER, &self.api_key)
            .query(&[("coverage_threshold", coverage_threshold)])
            .multipart(form);
        if let Some(group) = group_by {
            request = request.query(&[("group_by", group.as_str())]);
        }

        let response = request.send().await.map_err(ApiError::Network)?;
        let response = Self::check_status(response).await?;
        let body: MatrixResponse = response.json().await.map_err(ApiError::Network)?;

        if !self.matrix_channel.is_current(ticket) {
            debug!(ticket, "discarding stale matrix response");
            return Ok(None);
        }
        Ok(Some(body))
    }

    /// Upload a usage file and request the analytics aggregates.
    ///
    /// Returns `Ok(None)` when superseded on the analytics channel.
    pub async fn fetch_analytics(
        &self,
        file_path: &Path,
        group_by: Option<GroupBy>,
    ) -> Result<Option<AnalyticsResponse>, ApiError> {
        let ticket = self.analytics_channel.begin();
        let form = self.upload_form(file_path)?;

        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, ANALYTICS_PATH))
            .header(API_KEY_HEADER, &self.api_key)
            .multipart(form);
        if let Some(group) = group_by {
            request = request.query(&[("group_by", group.as_str())]);
        }

        let response = request.send().await.map_err(ApiError::Network)?;
        let response = Self::check_status(response).await?;
        let body: AnalyticsResponse = response.json().await.map_err(ApiError::Network)?;

        if !self.analytics_channel.is_current(ticket) {
            debug!(ticket, "discarding stale analytics response");
            return Ok(None);
        }
        Ok(Some(body))
    }

    fn upload_form(&self, file_path: &Path) -> Result<Form, ApiError> {
        let bytes = std::fs::read(file_path).map_err(|e| ApiError::UploadReadFailed {
            path: file_path.to_path_buf(),
            source: e,
        })?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "usage.csv".to_string());
        let part = Part::bytes(bytes).file_name(file_name);
        Ok(Form::new().part("file", part))
    }

    /// Map a non-2xx response to `RequestFailed`, preferring the server's
    /// `detail` message.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::RequestFailed {
            status: status.as_u16(),
            detail: extract_detail(&body),
        })
    }
}

fn extract_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| "The aggregation service rejected the request".to_string())
}
