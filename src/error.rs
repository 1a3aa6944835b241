use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocfillError>;

#[derive(Error, Debug)]
pub enum DocfillError {
    // Engine errors
    #[error("Template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Unsupported template format: {} (expected .txt, .docx or .doc)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("Unmatched placeholders found: {}", .0.join(", "))]
    UnmatchedPlaceholders(Vec<String>),

    // Standard library errors with automatic conversion
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Coarse classification callers can branch on without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TemplateNotFound,
    UnsupportedFormat,
    OutputExists,
    UnmatchedPlaceholders,
    IoFailure,
    Configuration,
}

impl DocfillError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocfillError::TemplateNotFound(_) => ErrorKind::TemplateNotFound,
            DocfillError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            DocfillError::OutputExists(_) => ErrorKind::OutputExists,
            DocfillError::UnmatchedPlaceholders(_) => ErrorKind::UnmatchedPlaceholders,
            DocfillError::Io(_)
            | DocfillError::Archive(_)
            | DocfillError::Document(_) => ErrorKind::IoFailure,
            DocfillError::Serde(_)
            | DocfillError::Yaml(_)
            | DocfillError::Configuration(_)
            | DocfillError::Validation(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn document(err: impl std::fmt::Display) -> Self {
        DocfillError::Document(err.to_string())
    }
}

impl From<config::ConfigError> for DocfillError {
    fn from(err: config::ConfigError) -> Self {
        DocfillError::Configuration(err.to_string())
    }
}
