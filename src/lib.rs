#![forbid(unsafe_code)]

//! Quality Report Viewer (qrv) — view-state engine for generated
//! software-quality reports.
//!
//! The engine is a strict model/message/update loop:
//! 1. **Model** — one [`view::model::ReportModel`] holds the complete display
//!    state: filters, sort order, display toggles, and per-row detail panes
//! 2. **Messages** — every user action and fetch completion is a
//!    [`view::model::ReportMsg`], applied strictly in issue order
//! 3. **Controller** — [`view::controller::ReportViewController`] runs the
//!    loop, persists changed state slices, and executes fetch commands
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use quality_report_viewer::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use quality_report_viewer::core::config::ViewerConfig;
//! use quality_report_viewer::view::controller::ReportViewController;
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod report;
pub mod source;
pub mod view;
