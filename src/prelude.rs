//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use quality_report_viewer::prelude::*;
//! ```

// Core
pub use crate::core::config::{DisplayConfig, ViewerConfig};
pub use crate::core::errors::{QrvError, Result};

// Report domain
pub use crate::report::dataset::{DatasetWarnings, ReportDataset, ReportFreshness, Section};
pub use crate::report::extra_info::ExtraInfoPanel;
pub use crate::report::history::MetricHistory;
pub use crate::report::metric::Metric;
pub use crate::report::status::MetricStatus;

// Sources
pub use crate::source::fs::FsReportSource;
pub use crate::source::request::ResourceRequest;
pub use crate::source::{DatasetSource, HistorySource};

// View-state engine
pub use crate::view::controller::ReportViewController;
pub use crate::view::filter::Filter;
pub use crate::view::model::{LoadPhase, ReportCmd, ReportModel, ReportMsg};
pub use crate::view::sort::{SortColumn, SortState};
pub use crate::view::storage::{FileStore, KeyValueStore, MemoryStore};

// Diagnostics
pub use crate::logger::jsonl::DiagnosticsLog;
