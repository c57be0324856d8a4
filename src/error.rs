//! Error types for the report pipeline.
//!
//! Each stage owns its own error enum so that a failure can always be traced
//! back to the input file, column, plot request or artifact path that caused it.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or parse the tabular input. Always fatal.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV input has no header row")]
    Empty,

    #[error("row {row} has {found} fields, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Failure to turn a user selection into a plot plan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// One or more user-named columns are absent from the schema.
    #[error("column(s) not found in dataset: {}", .columns.join(", "))]
    ColumnNotFound { columns: Vec<String> },

    #[error("invalid plot selection: {0}")]
    InvalidSelection(String),
}

/// Failure to render one plot request. Reported per request, never fatal to a plan.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{artifact}: column '{column}' contains non-numeric value '{value}'")]
    NonNumeric {
        artifact: String,
        column: String,
        value: String,
    },

    #[error("{artifact}: no plottable values")]
    NoData { artifact: String },

    #[error("{artifact}: column '{column}' not found")]
    MissingColumn { artifact: String, column: String },

    #[error("{artifact}: drawing failed: {reason}")]
    Draw { artifact: String, reason: String },

    #[error("{artifact}: failed to write '{path}': {source}")]
    Io {
        artifact: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// Artifact name of the request that failed.
    pub fn artifact(&self) -> &str {
        match self {
            Self::NonNumeric { artifact, .. }
            | Self::NoData { artifact }
            | Self::MissingColumn { artifact, .. }
            | Self::Draw { artifact, .. }
            | Self::Io { artifact, .. } => artifact,
        }
    }
}

/// Failure while assembling the paginated document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("failed to read artifact '{path}': {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write document '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF error: {0}")]
    Pdf(String),
}

/// Failure of a whole report run.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("failed to prepare output directory '{path}': {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid or unreadable configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failure of a command before or during dispatch.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("invalid command: {0}")]
    Invalid(String),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Report(#[from] ReportError),
}
