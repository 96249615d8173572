//! Typed report data: metrics, statuses, sections, dashboard, history.

pub mod dataset;
pub mod extra_info;
pub mod history;
pub mod metric;
pub mod status;
