//! Outbound interface to the usage-aggregation service.
//!
//! The service parses uploaded usage files; this side only ships the file,
//! carries the query parameters, and maps the response onto engine types.

pub mod client;

pub use client::{AggregationClient, AnalyticsResponse, MatrixResponse, RequestChannel};
