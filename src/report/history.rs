//! Per-metric historical series for the detail pane.

/// Ordered numeric series backing a detail-pane trend chart.
///
/// The wire format is a comma-separated list of numbers. History documents
/// are untrusted: a document containing anything that is not a number
/// degrades to the empty series instead of failing, matching how every other
/// external input is defaulted rather than fatal. Empty entries (trailing
/// commas, blank lines) are tolerated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricHistory {
    values: Vec<f64>,
}

impl MetricHistory {
    /// Parse the comma-separated wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut values = Vec::new();
        for entry in raw.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            match entry.parse::<f64>() {
                Ok(value) => values.push(value),
                Err(_) => return Self::default(),
            }
        }
        Self { values }
    }

    /// Wrap an already-parsed series.
    #[must_use]
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// The series, oldest value first.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Whether the series holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Most recent value, if any.
    #[must_use]
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }
}
