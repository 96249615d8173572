//! Metric status enumeration shared by filtering, sorting, and display.
//!
//! Statuses form a closed set. Anything else coming off the wire is kept as a
//! raw string by the dataset loader so it can be logged and excluded without
//! aborting the rest of the report.

use serde::{Deserialize, Serialize};

/// Status of one measured metric, ordered by rank (worst first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    /// Measurement violates the norm.
    Red,
    /// Measurement is close to violating the norm.
    Yellow,
    /// Measurement satisfies the norm.
    Green,
    /// Measurement is at the best possible value.
    Perfect,
    /// Metric is inactive or not applicable.
    Grey,
    /// Measurement could not be taken.
    Missing,
    /// A metric source is not configured.
    MissingSource,
}

/// Every status, in rank order.
pub const ALL_STATUSES: [MetricStatus; 7] = [
    MetricStatus::Red,
    MetricStatus::Yellow,
    MetricStatus::Green,
    MetricStatus::Perfect,
    MetricStatus::Grey,
    MetricStatus::Missing,
    MetricStatus::MissingSource,
];

impl MetricStatus {
    /// Parse a wire status string. Returns `None` for anything outside the set.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "red" => Some(Self::Red),
            "yellow" => Some(Self::Yellow),
            "green" => Some(Self::Green),
            "perfect" => Some(Self::Perfect),
            "grey" => Some(Self::Grey),
            "missing" => Some(Self::Missing),
            "missing_source" => Some(Self::MissingSource),
            _ => None,
        }
    }

    /// Wire name, identical to the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Perfect => "perfect",
            Self::Grey => "grey",
            Self::Missing => "missing",
            Self::MissingSource => "missing_source",
        }
    }

    /// Sort rank used by the trend and status columns.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Red => 0,
            Self::Yellow => 1,
            Self::Green => 2,
            Self::Perfect => 3,
            Self::Grey => 4,
            Self::Missing => 5,
            Self::MissingSource => 6,
        }
    }

    /// Emoji alias matched verbatim by the search predicate.
    #[must_use]
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Red => "\u{1f534}",
            Self::Yellow => "\u{1f7e1}",
            Self::Green => "\u{1f7e2}",
            Self::Perfect => "\u{1f3c6}",
            Self::Grey => "\u{26aa}",
            Self::Missing => "\u{2753}",
            Self::MissingSource => "\u{1f527}",
        }
    }
}
