//! Read-only projection over the opaque `extra_info` payload.
//!
//! The payload shape is owned by the report generator: `{"title": ...,
//! "headers": {key: text, ...}, "data": [{key: value, ...}, ...]}`. Header
//! texts starting with `_` are hidden format hints (a truthy row value there
//! contributes the hint, minus the underscore, as a row style class), and a
//! header of the form `caption__class` splits into caption and column style
//! class. Anything that fails to match this shape degrades to an empty
//! projection; the payload is untrusted and never an error source.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

// An invalid pattern would simply never match (LazyLock<Option<Regex>> = None).
static WARNING_ID_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new("[a-fA-F0-9]{32}").ok());

fn looks_like_warning_id(text: &str) -> bool {
    WARNING_ID_RE.as_ref().is_some_and(|re| re.is_match(text))
}

/// One visible column of the detail table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraInfoColumn {
    /// Key into the row objects.
    pub key: String,
    /// Display caption.
    pub caption: String,
    /// Optional column style class from a `caption__class` header.
    pub style_class: Option<String>,
}

/// Reference to an external warning suppressible through the false-positive API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningRef {
    /// 32-hex content hash identifying the warning.
    pub warning_id: String,
    /// Whether the warning is currently marked as a false positive.
    pub marked: bool,
    /// Reason given when the warning was marked.
    pub reason: String,
    /// Base URL of the false-positive service.
    pub api_url: String,
}

/// A single projected display cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraInfoCell {
    /// Missing or null value.
    Empty,
    /// Plain display text.
    Text(String),
    /// External link.
    Link {
        href: String,
        text: String,
    },
    /// List of values rendered comma-separated.
    List(Vec<ExtraInfoCell>),
    /// False-positive warning tuple.
    Warning(WarningRef),
}

impl ExtraInfoCell {
    /// Flat display text, links reduced to their text, lists joined with `", "`.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(text) => text.clone(),
            Self::Link { text, .. } => text.clone(),
            Self::List(items) => items
                .iter()
                .map(Self::display)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Warning(warning) => warning.warning_id.clone(),
        }
    }
}

/// One projected row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraInfoRow {
    /// Cells aligned with the panel's visible columns.
    pub cells: Vec<ExtraInfoCell>,
    /// Row style classes contributed by truthy format columns.
    pub style_classes: Vec<String>,
}

impl ExtraInfoRow {
    /// The row's warning reference, when one of its cells carries one.
    #[must_use]
    pub fn warning(&self) -> Option<&WarningRef> {
        self.cells.iter().find_map(|cell| match cell {
            ExtraInfoCell::Warning(warning) => Some(warning),
            _ => None,
        })
    }
}

/// Typed detail-pane table projected from one metric's `extra_info`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraInfoPanel {
    /// Panel heading.
    pub title: String,
    /// Visible columns in wire order.
    pub columns: Vec<ExtraInfoColumn>,
    /// Projected rows in wire order.
    pub rows: Vec<ExtraInfoRow>,
}

impl ExtraInfoPanel {
    /// Project the payload. Never fails; unexpected shapes yield an empty panel.
    #[must_use]
    pub fn project(payload: &Value) -> Self {
        let Some(object) = payload.as_object() else {
            return Self::default();
        };
        let title = object
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let Some(headers) = object.get("headers").and_then(Value::as_object) else {
            return Self {
                title,
                ..Self::default()
            };
        };

        let mut columns = Vec::new();
        let mut format_columns: Vec<(String, String)> = Vec::new();
        for (key, text) in headers {
            let text = text.as_str().unwrap_or_default();
            if let Some(hint) = text.strip_prefix('_') {
                format_columns.push((key.clone(), hint.to_owned()));
            } else {
                let (caption, style_class) = match text.split_once("__") {
                    Some((caption, class)) => (caption.to_owned(), Some(class.to_owned())),
                    None => (text.to_owned(), None),
                };
                columns.push(ExtraInfoColumn {
                    key: key.clone(),
                    caption,
                    style_class,
                });
            }
        }

        let rows = object
            .get("data")
            .and_then(Value::as_array)
            .map(|data| {
                data.iter()
                    .filter_map(Value::as_object)
                    .map(|row| project_row(row, &columns, &format_columns))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title,
            columns,
            rows,
        }
    }

    /// Whether the projection carries anything to display.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Every warning reference in the panel, row order.
    #[must_use]
    pub fn warnings(&self) -> Vec<&WarningRef> {
        self.rows.iter().filter_map(ExtraInfoRow::warning).collect()
    }
}

fn project_row(
    row: &serde_json::Map<String, Value>,
    columns: &[ExtraInfoColumn],
    format_columns: &[(String, String)],
) -> ExtraInfoRow {
    let style_classes = format_columns
        .iter()
        .filter(|(key, _)| is_truthy_flag(row.get(key)))
        .map(|(_, hint)| hint.clone())
        .collect();
    let cells = columns
        .iter()
        .map(|column| project_cell(row.get(&column.key)))
        .collect();
    ExtraInfoRow {
        cells,
        style_classes,
    }
}

fn is_truthy_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => text == "true",
        _ => false,
    }
}

fn project_cell(value: Option<&Value>) -> ExtraInfoCell {
    match value {
        None | Some(Value::Null) => ExtraInfoCell::Empty,
        Some(Value::String(text)) => ExtraInfoCell::Text(text.clone()),
        Some(Value::Bool(flag)) => ExtraInfoCell::Text(flag.to_string()),
        Some(Value::Number(number)) => ExtraInfoCell::Text(number.to_string()),
        Some(Value::Object(object)) => project_object_cell(object),
        Some(Value::Array(items)) => project_array_cell(items),
    }
}

fn project_object_cell(object: &serde_json::Map<String, Value>) -> ExtraInfoCell {
    let text = object
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default();
    match object.get("href").and_then(Value::as_str) {
        Some(href) => ExtraInfoCell::Link {
            href: href.to_owned(),
            text: if text.is_empty() {
                href.to_owned()
            } else {
                text.to_owned()
            },
        },
        None if !text.is_empty() => ExtraInfoCell::Text(text.to_owned()),
        None => ExtraInfoCell::Empty,
    }
}

fn project_array_cell(items: &[Value]) -> ExtraInfoCell {
    let first = items.first().and_then(Value::as_str).unwrap_or_default();
    if looks_like_warning_id(first) {
        return ExtraInfoCell::Warning(WarningRef {
            warning_id: first.to_owned(),
            marked: is_truthy_flag(items.get(1)),
            reason: items
                .get(2)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
            api_url: items
                .get(3)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned(),
        });
    }
    ExtraInfoCell::List(items.iter().map(|item| project_cell(Some(item))).collect())
}
