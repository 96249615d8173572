//! Per-row detail-pane expansion state.
//!
//! Each row walks `collapsed → expanding → expanded` and back to collapsed on
//! re-click. The first open issues exactly one history fetch for the row
//! instance; the response is cached whenever it arrives, including after the
//! row collapsed again. Nothing is ever discarded until the dataset itself is
//! replaced.

use std::collections::HashMap;

use crate::report::history::MetricHistory;

/// Expansion state of one row's detail pane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowExpansion {
    /// Pane closed.
    #[default]
    Collapsed,
    /// Pane open, series not yet arrived.
    Expanding,
    /// Pane open with its cached series.
    Expanded,
}

/// Detail state for one row instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailRow {
    /// Current pane state.
    pub expansion: RowExpansion,
    fetch_issued: bool,
    history: Option<MetricHistory>,
}

impl DetailRow {
    /// Whether the pane is visually open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.expansion, RowExpansion::Expanding | RowExpansion::Expanded)
    }

    /// The cached series, when one has arrived.
    #[must_use]
    pub const fn history(&self) -> Option<&MetricHistory> {
        self.history.as_ref()
    }

    /// Values to render: the cached series, or nothing while pending. A row
    /// with no data yet renders an empty chart rather than blocking.
    #[must_use]
    pub fn series(&self) -> &[f64] {
        self.history.as_ref().map_or(&[], MetricHistory::values)
    }
}

/// Detail rows for the lifetime of one loaded report, keyed by metric id.
#[derive(Debug, Clone, Default)]
pub struct DetailPanes {
    rows: HashMap<String, DetailRow>,
}

impl DetailPanes {
    /// State for one row, if it was ever touched.
    #[must_use]
    pub fn row(&self, id_value: &str) -> Option<&DetailRow> {
        self.rows.get(id_value)
    }

    /// Whether a row's pane is open.
    #[must_use]
    pub fn is_open(&self, id_value: &str) -> bool {
        self.rows.get(id_value).is_some_and(DetailRow::is_open)
    }

    /// Toggle one row. Returns `true` when the caller must issue the row's
    /// history fetch (first open of this row instance only).
    #[must_use]
    pub fn toggle(&mut self, id_value: &str) -> bool {
        let row = self.rows.entry(id_value.to_owned()).or_default();
        match row.expansion {
            RowExpansion::Collapsed => {
                if row.history.is_some() {
                    row.expansion = RowExpansion::Expanded;
                    return false;
                }
                row.expansion = RowExpansion::Expanding;
                if row.fetch_issued {
                    return false;
                }
                row.fetch_issued = true;
                true
            }
            RowExpansion::Expanding | RowExpansion::Expanded => {
                row.expansion = RowExpansion::Collapsed;
                false
            }
        }
    }

    /// Cache an arrived series on its row. Arrival while collapsed is
    /// harmless; arrival while expanding completes the expansion.
    pub fn absorb(&mut self, id_value: &str, history: MetricHistory) {
        let row = self.rows.entry(id_value.to_owned()).or_default();
        row.history = Some(history);
        row.fetch_issued = true;
        if row.expansion == RowExpansion::Expanding {
            row.expansion = RowExpansion::Expanded;
        }
    }

    /// Drop every row. Used when a fresh dataset replaces the report.
    pub fn reset(&mut self) {
        self.rows.clear();
    }

    /// Number of rows whose pane is open.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.rows.values().filter(|row| row.is_open()).count()
    }
}
