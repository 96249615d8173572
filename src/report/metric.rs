//! Typed metric model decoded from the report dataset.
//!
//! Decoding is split in two: [`MetricDoc`] mirrors the wire document with
//! every field defaulted (report generators have emitted sparse documents in
//! the past), and [`Metric`] is the validated runtime type the engine works
//! with. Validation never rejects a metric: an unrecognized status is kept as
//! a raw string so the loader can log it and the filter can exclude it.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::report::status::MetricStatus;

/// Validated status slot. The wire string survives even when unrecognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusField {
    /// A status inside the closed set.
    Known(MetricStatus),
    /// Anything else the generator emitted, verbatim.
    Unknown(String),
}

impl StatusField {
    /// Validate a wire status string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        MetricStatus::parse(raw).map_or_else(|| Self::Unknown(raw.to_owned()), Self::Known)
    }

    /// The validated status, if the wire value was recognized.
    #[must_use]
    pub const fn known(&self) -> Option<MetricStatus> {
        match self {
            Self::Known(status) => Some(*status),
            Self::Unknown(_) => None,
        }
    }

    /// Wire representation, recognized or not.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(status) => status.as_str(),
            Self::Unknown(raw) => raw,
        }
    }
}

/// One measured quality indicator, immutable for the lifetime of a loaded report.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    /// Unique key within one loaded report, e.g. `"PD-01"`.
    pub id_value: String,
    /// Display label, e.g. `"PD-1"`.
    pub id_format: String,
    /// Identifier stable across report versions; may contain spaces.
    pub stable_metric_id: String,
    /// Human-readable metric name.
    pub name: String,
    /// Unit of the measured value.
    pub unit: String,
    /// Grouping key matching a section id.
    pub section: String,
    /// Validated status.
    pub status: StatusField,
    /// Moment the current status was first measured, when known.
    pub status_start_date: Option<NaiveDateTime>,
    /// Raw measured value.
    pub value: String,
    /// Raw numerical value used by external chart widgets.
    pub numerical_value: String,
    /// Measurement sentence shown in the table.
    pub measurement: String,
    /// Norm sentence shown in the table.
    pub norm: String,
    /// Optional comment.
    pub comment: String,
    /// Generator-side class name of the metric.
    pub metric_class: String,
    /// Opaque structured payload for the detail pane.
    pub extra_info: serde_json::Value,
}

impl Metric {
    /// Build the runtime metric from its wire document.
    #[must_use]
    pub fn from_doc(doc: MetricDoc) -> Self {
        Self {
            id_value: doc.id_value,
            id_format: doc.id_format,
            stable_metric_id: doc.stable_metric_id,
            name: doc.name,
            unit: doc.unit,
            section: doc.section,
            status: StatusField::parse(&doc.status),
            status_start_date: parse_date_array(&doc.status_start_date),
            value: doc.value,
            numerical_value: doc.numerical_value,
            measurement: doc.measurement,
            norm: doc.norm,
            comment: doc.comment,
            metric_class: doc.metric_class,
            extra_info: doc.extra_info,
        }
    }

    /// Rank used by the trend and status sort columns. Unrecognized statuses
    /// order after every known one.
    #[must_use]
    pub fn status_rank(&self) -> u8 {
        self.status.known().map_or(u8::MAX, MetricStatus::rank)
    }

    /// `stable_metric_id` with spaces replaced by underscores, as used in
    /// history resource paths.
    #[must_use]
    pub fn sanitized_stable_id(&self) -> String {
        self.stable_metric_id.replace(' ', "_")
    }

    /// The fields the free-text search scans, in match order.
    #[must_use]
    pub fn search_fields(&self) -> [&str; 4] {
        [&self.id_format, &self.measurement, &self.norm, &self.comment]
    }
}

/// Raw metric document as emitted by the report generator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricDoc {
    #[serde(default)]
    pub id_value: String,
    #[serde(default)]
    pub id_format: String,
    #[serde(default)]
    pub stable_metric_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_value: String,
    #[serde(default)]
    pub status_start_date: Vec<i64>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub numerical_value: String,
    #[serde(default)]
    pub measurement: String,
    #[serde(default)]
    pub norm: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub metric_class: String,
    #[serde(default = "empty_object")]
    pub extra_info: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Parse a `[year, month, day, hour, minute, second]` wire date.
///
/// Months are 1-based. Anything that is not a valid six-element timestamp
/// (empty array, short array, out-of-range components) yields `None`.
pub(crate) fn parse_date_array(parts: &[i64]) -> Option<NaiveDateTime> {
    if parts.len() != 6 {
        return None;
    }
    let year = i32::try_from(parts[0]).ok()?;
    let month = u32::try_from(parts[1]).ok()?;
    let day = u32::try_from(parts[2]).ok()?;
    let hour = u32::try_from(parts[3]).ok()?;
    let minute = u32::try_from(parts[4]).ok()?;
    let second = u32::try_from(parts[5]).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_status(status: &str) -> MetricDoc {
        MetricDoc {
            id_value: "PD-01".to_owned(),
            id_format: "PD-1".to_owned(),
            stable_metric_id: "ProductUnitTests Product X".to_owned(),
            status: status.to_owned(),
            status_start_date: vec![2026, 3, 14, 9, 26, 53],
            ..MetricDoc::default()
        }
    }

    #[test]
    fn from_doc_validates_known_status() {
        let metric = Metric::from_doc(doc_with_status("yellow"));
        assert_eq!(metric.status, StatusField::Known(MetricStatus::Yellow));
        assert_eq!(metric.status.as_str(), "yellow");
        assert_eq!(metric.status_rank(), 1);
    }

    #[test]
    fn from_doc_keeps_unknown_status_verbatim() {
        let metric = Metric::from_doc(doc_with_status("purple"));
        assert_eq!(metric.status, StatusField::Unknown("purple".to_owned()));
        assert_eq!(metric.status.as_str(), "purple");
        assert_eq!(metric.status_rank(), u8::MAX);
    }

    #[test]
    fn from_doc_parses_six_element_date() {
        let metric = Metric::from_doc(doc_with_status("green"));
        let date = metric.status_start_date.expect("date should parse");
        assert_eq!(
            date,
            NaiveDate::from_ymd_opt(2026, 3, 14)
                .unwrap()
                .and_hms_opt(9, 26, 53)
                .unwrap()
        );
    }

    #[test]
    fn empty_or_malformed_dates_become_none() {
        assert_eq!(parse_date_array(&[]), None);
        assert_eq!(parse_date_array(&[2026, 3, 14]), None);
        assert_eq!(parse_date_array(&[2026, 13, 1, 0, 0, 0]), None);
        assert_eq!(parse_date_array(&[2026, 0, 1, 0, 0, 0]), None);
        assert_eq!(parse_date_array(&[2026, 3, 14, 24, 0, 0]), None);
        assert_eq!(parse_date_array(&[2026, 3, 14, 9, 26, 53, 0]), None);
    }

    #[test]
    fn sanitized_stable_id_replaces_every_space() {
        let metric = Metric::from_doc(doc_with_status("green"));
        assert_eq!(
            metric.sanitized_stable_id(),
            "ProductUnitTests_Product_X"
        );
    }

    #[test]
    fn sparse_wire_document_decodes_with_defaults() {
        let doc: MetricDoc = serde_json::from_str(r#"{"id_value": "X-01"}"#).unwrap();
        let metric = Metric::from_doc(doc);
        assert_eq!(metric.id_value, "X-01");
        assert_eq!(metric.status, StatusField::Unknown(String::new()));
        assert_eq!(metric.status_start_date, None);
        assert!(metric.extra_info.as_object().unwrap().is_empty());
    }
}
