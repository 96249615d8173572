//! Filter state, its pure transitions, and the visibility predicate.
//!
//! **Design invariant:** `filter_all` is a derived display aggregate, always
//! recomputed as the AND of the color flags after every transition. It is
//! never written independently except by [`Filter::toggle_all`], which uses
//! its negation as the new value for every flag.
//!
//! All persisted-state decoding is merge-under-defaults: fields absent from
//! the stored blob keep their default, so a flag added in a later version
//! never starts hidden for returning users.

use chrono::{DateTime, NaiveDateTime, Utc};
use memchr::memmem;
use serde::{Deserialize, Serialize};

use crate::report::metric::Metric;
use crate::report::status::{ALL_STATUSES, MetricStatus};

/// Age beyond which a settled status is hidden by the week filter.
pub const WEEK_SECONDS: i64 = 60 * 60 * 24 * 7;

/// User-controlled visibility toggles plus search text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Filter {
    /// Derived AND of the color flags.
    pub filter_all: bool,
    /// When false, metrics whose status settled more than a week ago are hidden.
    pub filter_status_week: bool,
    pub filter_color_red: bool,
    pub filter_color_yellow: bool,
    pub filter_color_green: bool,
    pub filter_color_perfect: bool,
    pub filter_color_grey: bool,
    pub filter_color_missing: bool,
    pub filter_color_missing_source: bool,
    /// Ids hidden explicitly by the user. Append-only between clears;
    /// duplicates are harmless.
    pub hidden_metrics: Vec<String>,
    /// Lower-cased free-text search.
    pub search_string: String,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            filter_all: true,
            filter_status_week: true,
            filter_color_red: true,
            filter_color_yellow: true,
            filter_color_green: true,
            filter_color_perfect: true,
            filter_color_grey: true,
            filter_color_missing: true,
            filter_color_missing_source: true,
            hidden_metrics: Vec::new(),
            search_string: String::new(),
        }
    }
}

impl Filter {
    /// Rehydrate from a persisted blob. Absent or corrupt input yields the
    /// default all-visible filter; partial blobs merge over the defaults.
    #[must_use]
    pub fn from_persisted(raw: Option<&str>) -> Self {
        raw.and_then(|text| serde_json::from_str(text).ok())
            .unwrap_or_default()
    }

    /// The flag controlling visibility of one status.
    #[must_use]
    pub const fn color_flag(&self, status: MetricStatus) -> bool {
        match status {
            MetricStatus::Red => self.filter_color_red,
            MetricStatus::Yellow => self.filter_color_yellow,
            MetricStatus::Green => self.filter_color_green,
            MetricStatus::Perfect => self.filter_color_perfect,
            MetricStatus::Grey => self.filter_color_grey,
            MetricStatus::Missing => self.filter_color_missing,
            MetricStatus::MissingSource => self.filter_color_missing_source,
        }
    }

    const fn color_flag_mut(&mut self, status: MetricStatus) -> &mut bool {
        match status {
            MetricStatus::Red => &mut self.filter_color_red,
            MetricStatus::Yellow => &mut self.filter_color_yellow,
            MetricStatus::Green => &mut self.filter_color_green,
            MetricStatus::Perfect => &mut self.filter_color_perfect,
            MetricStatus::Grey => &mut self.filter_color_grey,
            MetricStatus::Missing => &mut self.filter_color_missing,
            MetricStatus::MissingSource => &mut self.filter_color_missing_source,
        }
    }

    fn recompute_all(&mut self) {
        self.filter_all = ALL_STATUSES.iter().all(|status| self.color_flag(*status));
    }

    /// Flip one color flag.
    pub fn toggle_color(&mut self, status: MetricStatus) {
        let flag = self.color_flag_mut(status);
        *flag = !*flag;
        self.recompute_all();
    }

    /// Flip the week filter.
    pub fn toggle_week(&mut self) {
        self.filter_status_week = !self.filter_status_week;
        self.recompute_all();
    }

    /// Set every color flag and the week flag to the negation of
    /// `filter_all`. Hidden metrics and the search text are untouched.
    pub fn toggle_all(&mut self) {
        let value = !self.filter_all;
        for status in ALL_STATUSES {
            *self.color_flag_mut(status) = value;
        }
        self.filter_status_week = value;
        self.recompute_all();
    }

    /// Forget every explicitly hidden metric.
    pub fn clear_hidden(&mut self) {
        self.hidden_metrics.clear();
    }

    /// Hide one metric by id. Appends even when already present.
    pub fn hide(&mut self, metric_id: &str) {
        self.hidden_metrics.push(metric_id.to_owned());
    }

    /// Store the search text, lower-cased.
    pub fn set_search(&mut self, text: &str) {
        self.search_string = text.to_lowercase();
    }

    /// Whether an id is on the hidden list.
    #[must_use]
    pub fn is_hidden(&self, id_value: &str) -> bool {
        self.hidden_metrics.iter().any(|id| id == id_value)
    }

    /// Number of hidden entries (duplicates included), shown by the menu.
    #[must_use]
    pub fn hidden_count(&self) -> usize {
        self.hidden_metrics.len()
    }

    // ──────────────────── predicate ────────────────────

    /// Whether one metric passes the filter at `now`.
    ///
    /// Pass order: search, hidden list, week age, status flag. A metric
    /// failing an earlier pass is excluded regardless of the later ones.
    #[must_use]
    pub fn matches(&self, metric: &Metric, now: NaiveDateTime) -> bool {
        if !self.search_string.is_empty() && !self.matches_search(metric) {
            return false;
        }
        if self.is_hidden(&metric.id_value) {
            return false;
        }
        if !self.filter_status_week {
            let started = metric
                .status_start_date
                .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.naive_utc());
            if (now - started).num_seconds() > WEEK_SECONDS {
                return false;
            }
        }
        match metric.status.known() {
            Some(status) => self.color_flag(status),
            // Unknown statuses have no flag and are always excluded.
            None => false,
        }
    }

    fn matches_search(&self, metric: &Metric) -> bool {
        let needle = self.search_string.as_bytes();
        let in_fields = metric
            .search_fields()
            .iter()
            .any(|field| memmem::find(field.to_lowercase().as_bytes(), needle).is_some());
        in_fields
            || metric
                .status
                .known()
                .is_some_and(|status| status.emoji() == self.search_string)
    }

    /// Apply the predicate over a metric list, preserving input order.
    #[must_use]
    pub fn visible(&self, metrics: &[Metric], now: NaiveDateTime) -> Vec<Metric> {
        metrics
            .iter()
            .filter(|metric| self.matches(metric, now))
            .cloned()
            .collect()
    }
}
