//! QRV-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, QrvError>;

/// Top-level error type for Quality Report Viewer.
#[derive(Debug, Error)]
pub enum QrvError {
    #[error("[QRV-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[QRV-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[QRV-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[QRV-2001] dataset fetch failure for {resource}: {details}")]
    DatasetFetch { resource: String, details: String },

    #[error("[QRV-2002] malformed dataset document: {details}")]
    DatasetDecode { details: String },

    #[error("[QRV-2003] history fetch failure for metric {metric}: {details}")]
    HistoryFetch { metric: String, details: String },

    #[error("[QRV-2101] no metric with id {id} in the loaded report")]
    UnknownMetric { id: String },

    #[error("[QRV-2102] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[QRV-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[QRV-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[QRV-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl QrvError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "QRV-1001",
            Self::MissingConfig { .. } => "QRV-1002",
            Self::ConfigParse { .. } => "QRV-1003",
            Self::DatasetFetch { .. } => "QRV-2001",
            Self::DatasetDecode { .. } => "QRV-2002",
            Self::HistoryFetch { .. } => "QRV-2003",
            Self::UnknownMetric { .. } => "QRV-2101",
            Self::Serialization { .. } => "QRV-2102",
            Self::Io { .. } => "QRV-3002",
            Self::ChannelClosed { .. } => "QRV-3003",
            Self::Runtime { .. } => "QRV-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::ChannelClosed { .. }
                | Self::DatasetFetch { .. }
                | Self::HistoryFetch { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for QrvError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for QrvError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
