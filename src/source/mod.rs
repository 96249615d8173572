//! Data sources for the report dataset and per-metric history documents.
//!
//! The engine consumes two read-only resources: the dataset document, fetched
//! once per load, and one history series per expanded row. Both are addressed
//! through [`request::ResourceRequest`] values carrying a cache-buster token;
//! remote transports append the token as a query parameter, filesystem
//! sources ignore it.
//!
//! Fetches run on worker threads, so both traits are `Send + Sync`.

pub mod fs;
pub mod request;

use crate::core::errors::Result;
use crate::report::dataset::{DatasetWarnings, ReportDataset};
use crate::report::history::MetricHistory;
use crate::source::request::ResourceRequest;

/// Provider of the report dataset document.
pub trait DatasetSource: Send + Sync {
    /// Fetch and decode the dataset. A malformed document is an error;
    /// irregular metrics inside a well-formed one are returned as warnings.
    fn fetch_dataset(&self, request: &ResourceRequest)
    -> Result<(ReportDataset, DatasetWarnings)>;
}

/// Provider of per-metric history series.
pub trait HistorySource: Send + Sync {
    /// Fetch and parse one metric's historical values.
    fn fetch_history(&self, request: &ResourceRequest) -> Result<MetricHistory>;
}
