//! Filesystem-backed report sources.
//!
//! Reads a report directory laid out the way the generator publishes it:
//! `<root>/json/metrics.json` for the dataset and `<root>/json/<id>.txt` for
//! each history series. Cache-buster tokens are meaningless on a local
//! filesystem and are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::{QrvError, Result};
use crate::report::dataset::{DatasetWarnings, ReportDataset};
use crate::report::history::MetricHistory;
use crate::source::request::ResourceRequest;
use crate::source::{DatasetSource, HistorySource};

/// Report directory on disk.
#[derive(Debug, Clone)]
pub struct FsReportSource {
    root: PathBuf,
}

impl FsReportSource {
    /// Source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The report root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, request: &ResourceRequest) -> PathBuf {
        self.root.join(request.path())
    }
}

impl DatasetSource for FsReportSource {
    fn fetch_dataset(
        &self,
        request: &ResourceRequest,
    ) -> Result<(ReportDataset, DatasetWarnings)> {
        let path = self.resolve(request);
        let raw = fs::read_to_string(&path).map_err(|err| QrvError::DatasetFetch {
            resource: path.display().to_string(),
            details: err.to_string(),
        })?;
        ReportDataset::from_json(&raw)
    }
}

impl HistorySource for FsReportSource {
    fn fetch_history(&self, request: &ResourceRequest) -> Result<MetricHistory> {
        let path = self.resolve(request);
        let raw = fs::read_to_string(&path).map_err(|err| QrvError::HistoryFetch {
            metric: request.path().to_owned(),
            details: err.to_string(),
        })?;
        Ok(MetricHistory::parse(&raw))
    }
}
