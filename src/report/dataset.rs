//! The loaded report: metric list plus report-level metadata.
//!
//! A dataset is created once per load and never mutated. Decoding collects
//! [`DatasetWarnings`] instead of failing: a report with unrecognized
//! statuses or duplicated ids still loads, the findings are handed to the
//! caller for logging.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::core::errors::{QrvError, Result};
use crate::report::metric::{Metric, MetricDoc, parse_date_array};
use crate::report::status::{ALL_STATUSES, MetricStatus};

// ──────────────────── report-level metadata ────────────────────

/// Named grouping of metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Section {
    /// Grouping key referenced by `Metric::section`.
    #[serde(default)]
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Optional display subtitle.
    #[serde(default)]
    pub subtitle: String,
    /// Last product change, preformatted by the generator.
    #[serde(default)]
    pub latest_change_date: String,
}

/// Column header spanning one or more dashboard columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardHeader {
    /// Header text.
    #[serde(default)]
    pub header: String,
    /// Number of grid columns the header spans.
    #[serde(default = "default_span")]
    pub colspan: u32,
}

/// One cell of the dashboard grid. Cells without a `section_id` carry plain
/// text in `section_title`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardCell {
    /// Section the cell charts; empty for plain text cells.
    #[serde(default)]
    pub section_id: String,
    /// Display title (or the literal text for text cells).
    #[serde(default)]
    pub section_title: String,
    /// Background color as a CSS value.
    #[serde(default)]
    pub bgcolor: String,
    /// Number of grid columns the cell spans.
    #[serde(default = "default_span")]
    pub colspan: u32,
    /// Number of grid rows the cell spans.
    #[serde(default = "default_span")]
    pub rowspan: u32,
}

/// Dashboard layout descriptor: a grid of section cells under spanning headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardLayout {
    /// Spanning headers, left to right.
    #[serde(default)]
    pub headers: Vec<DashboardHeader>,
    /// Grid rows of cells.
    #[serde(default)]
    pub rows: Vec<Vec<DashboardCell>>,
}

fn default_span() -> u32 {
    1
}

// ──────────────────── load-time findings ────────────────────

/// Loader findings that do not abort the load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetWarnings {
    /// `(id_value, raw status)` for every status outside the closed set.
    pub unknown_statuses: Vec<(String, String)>,
    /// Metric ids seen more than once.
    pub duplicate_ids: Vec<String>,
}

impl DatasetWarnings {
    /// Whether the loader found anything worth logging.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        !self.unknown_statuses.is_empty() || !self.duplicate_ids.is_empty()
    }
}

/// Freshness classification for the report timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFreshness {
    /// Generated within the last hour.
    Current,
    /// Older than an hour.
    Old,
    /// Older than a day.
    VeryOld,
    /// The document carried no usable timestamp.
    Undated,
}

/// Per-status metric tally for the summary view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    counts: [usize; 7],
    unknown: usize,
}

impl StatusCounts {
    /// Count for one known status.
    #[must_use]
    pub const fn get(&self, status: MetricStatus) -> usize {
        self.counts[status.rank() as usize]
    }

    /// Metrics whose status fell outside the closed set.
    #[must_use]
    pub const fn unknown(&self) -> usize {
        self.unknown
    }

    /// Total number of tallied metrics.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.unknown
    }
}

// ──────────────────── the dataset ────────────────────

/// The full immutable report consumed by the view-state engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDataset {
    /// Report title shown in the chrome.
    pub report_title: String,
    /// Moment the report was generated, when the document carried one.
    pub report_date: Option<NaiveDateTime>,
    /// Version of the generator that produced the document, possibly empty.
    pub generator_version: String,
    /// Sections in display order.
    pub sections: Vec<Section>,
    /// Dashboard layout descriptor.
    pub dashboard: DashboardLayout,
    /// Metrics in document order.
    pub metrics: Vec<Metric>,
}

impl ReportDataset {
    /// Decode a dataset document from its JSON text.
    ///
    /// # Errors
    /// Returns [`QrvError::DatasetDecode`] when the document is not valid
    /// JSON of the expected overall shape. Per-metric irregularities never
    /// fail the load; they are reported through [`DatasetWarnings`].
    pub fn from_json(raw: &str) -> Result<(Self, DatasetWarnings)> {
        let doc: ReportDoc = serde_json::from_str(raw).map_err(|err| QrvError::DatasetDecode {
            details: err.to_string(),
        })?;
        Ok(Self::from_doc(doc))
    }

    /// Build the runtime dataset from its wire document.
    #[must_use]
    pub fn from_doc(doc: ReportDoc) -> (Self, DatasetWarnings) {
        let mut warnings = DatasetWarnings::default();
        let mut seen: HashSet<String> = HashSet::new();
        let metrics: Vec<Metric> = doc.metrics.into_iter().map(Metric::from_doc).collect();

        for metric in &metrics {
            if metric.status.known().is_none() {
                warnings
                    .unknown_statuses
                    .push((metric.id_value.clone(), metric.status.as_str().to_owned()));
            }
            if !seen.insert(metric.id_value.clone()) {
                warnings.duplicate_ids.push(metric.id_value.clone());
            }
        }

        let dataset = Self {
            report_title: doc.report_title,
            report_date: parse_date_array(&doc.report_date),
            generator_version: doc.generator_version,
            sections: doc.sections,
            dashboard: doc.dashboard,
            metrics,
        };
        (dataset, warnings)
    }

    /// Look up one metric by its unique id.
    #[must_use]
    pub fn metric(&self, id_value: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.id_value == id_value)
    }

    /// Look up a section title by id.
    #[must_use]
    pub fn section_title(&self, id: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.title.as_str())
    }

    /// Tally metrics per status.
    #[must_use]
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for metric in &self.metrics {
            match metric.status.known() {
                Some(status) => counts.counts[status.rank() as usize] += 1,
                None => counts.unknown += 1,
            }
        }
        counts
    }

    /// Classify the report timestamp against `now`.
    #[must_use]
    pub fn freshness(&self, now: NaiveDateTime) -> ReportFreshness {
        let Some(date) = self.report_date else {
            return ReportFreshness::Undated;
        };
        let seconds = (now - date).num_seconds();
        if seconds > 60 * 60 * 24 {
            ReportFreshness::VeryOld
        } else if seconds > 60 * 60 {
            ReportFreshness::Old
        } else {
            ReportFreshness::Current
        }
    }
}

/// Raw dataset document as emitted by the report generator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportDoc {
    #[serde(default)]
    pub report_title: String,
    #[serde(default)]
    pub report_date: Vec<i64>,
    #[serde(default)]
    pub generator_version: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub dashboard: DashboardLayout,
    #[serde(default)]
    pub metrics: Vec<MetricDoc>,
}
