//! Sort state and the stable ordering it induces on metric lists.
//!
//! Columns and comparison keys are distinct: the sparkline and status
//! columns both order by status rank, not by a display string. The
//! column→key mapping is fixed; persisted blobs that disagree with it are
//! accepted as stored and re-aligned on the next header click.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::report::metric::Metric;

/// Clickable table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum SortColumn {
    IdFormat,
    Sparkline,
    StatusFormat,
    Measurement,
    Norm,
    Comment,
}

/// Every column, in table order.
pub const ALL_COLUMNS: [SortColumn; 6] = [
    SortColumn::IdFormat,
    SortColumn::Sparkline,
    SortColumn::StatusFormat,
    SortColumn::Measurement,
    SortColumn::Norm,
    SortColumn::Comment,
];

impl SortColumn {
    /// The metric field this column orders by.
    #[must_use]
    pub const fn key(self) -> SortKey {
        match self {
            Self::IdFormat => SortKey::IdValue,
            Self::Sparkline | Self::StatusFormat => SortKey::StatusValue,
            Self::Measurement => SortKey::Measurement,
            Self::Norm => SortKey::Norm,
            Self::Comment => SortKey::Comment,
        }
    }

    /// Wire name, identical to the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IdFormat => "id_format",
            Self::Sparkline => "sparkline",
            Self::StatusFormat => "status_format",
            Self::Measurement => "measurement",
            Self::Norm => "norm",
            Self::Comment => "comment",
        }
    }

    /// Parse a wire column name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        ALL_COLUMNS.into_iter().find(|c| c.as_str() == raw)
    }

    /// Human caption for table headers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::IdFormat => "Metric",
            Self::Sparkline => "Trend",
            Self::StatusFormat => "Status",
            Self::Measurement => "Measurement",
            Self::Norm => "Norm",
            Self::Comment => "Comment",
        }
    }
}

/// Metric field actually compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum SortKey {
    IdValue,
    StatusValue,
    Measurement,
    Norm,
    Comment,
}

impl SortKey {
    fn compare(self, a: &Metric, b: &Metric) -> Ordering {
        match self {
            Self::IdValue => a.id_value.cmp(&b.id_value),
            Self::StatusValue => a.status_rank().cmp(&b.status_rank()),
            Self::Measurement => a.measurement.cmp(&b.measurement),
            Self::Norm => a.norm.cmp(&b.norm),
            Self::Comment => a.comment.cmp(&b.comment),
        }
    }
}

/// Active sort column, comparison key, and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortState {
    /// Column whose header is highlighted.
    pub column_name: SortColumn,
    /// Field actually compared; follows the column on every click.
    pub sort_key: SortKey,
    /// Direction flag, flipped by re-clicking the active column.
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column_name: SortColumn::IdFormat,
            sort_key: SortKey::IdValue,
            ascending: true,
        }
    }
}

impl SortState {
    /// Rehydrate from a persisted blob. Absent or corrupt input (including
    /// an unrecognized column name) yields the default state.
    #[must_use]
    pub fn from_persisted(raw: Option<&str>) -> Self {
        raw.and_then(|text| serde_json::from_str(text).ok())
            .unwrap_or_default()
    }

    /// React to a header click: re-clicking the active column flips the
    /// direction, any other column becomes active with its mapped key and
    /// the direction unchanged.
    pub fn on_header_click(&mut self, clicked: SortColumn) {
        if clicked == self.column_name {
            self.ascending = !self.ascending;
        } else {
            self.column_name = clicked;
            self.sort_key = clicked.key();
        }
    }

    /// Return a sorted copy. The sort is stable: ties keep their incoming
    /// relative order, so applying the same state twice is a no-op.
    #[must_use]
    pub fn apply(&self, metrics: &[Metric]) -> Vec<Metric> {
        let mut sorted = metrics.to_vec();
        sorted.sort_by(|a, b| {
            let ord = self.sort_key.compare(a, b);
            if self.ascending { ord } else { ord.reverse() }
        });
        sorted
    }
}
