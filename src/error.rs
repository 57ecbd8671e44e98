use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating or converting a dataset.
///
/// Per-record variants are collected into reports and never abort a batch.
/// `Io` and `Csv` only surface for failures on the run's own inputs/outputs.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A required file or directory does not exist.
    #[error("{what} not found: {}", path.display())]
    MissingPath { what: String, path: PathBuf },

    /// A record is malformed or missing a required field.
    #[error("{location}: {message}")]
    Schema { location: String, message: String },

    /// A field that should be numeric could not be parsed.
    #[error("{location}: invalid numeric value {value:?}")]
    Parse { location: String, value: String },

    /// A box lies outside its image or has no area.
    #[error("{location}: {message}")]
    Bounds { location: String, message: String },

    /// A class id or class name is not part of the class set.
    #[error("{location}: unknown class {class:?}")]
    Class { location: String, class: String },

    /// An image could not be decoded or has the wrong channel layout.
    #[error("could not read image {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl DatasetError {
    pub fn missing(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingPath {
            what: what.into(),
            path: path.into(),
        }
    }

    pub fn schema(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn parse(location: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Parse {
            location: location.into(),
            value: value.into(),
        }
    }

    pub fn bounds(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bounds {
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn class(location: impl Into<String>, class: impl Into<String>) -> Self {
        Self::Class {
            location: location.into(),
            class: class.into(),
        }
    }

    pub fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }

    /// Short category name used when tallying errors in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingPath { .. } => "missing-path",
            Self::Schema { .. } => "schema",
            Self::Parse { .. } => "parse",
            Self::Bounds { .. } => "bounds",
            Self::Class { .. } => "class",
            Self::Decode { .. } => "decode",
            Self::Io { .. } => "io",
            Self::Csv { .. } => "csv",
        }
    }
}

pub type Result<T, E = DatasetError> = std::result::Result<T, E>;
