use std::path::Path;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GradleditError {
    #[error("Failed to read file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read stdin: {source}")]
    StdinRead {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON request: {source}")]
    InvalidJsonRequest {
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize response JSON: {source}")]
    ResponseSerialization {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid configuration file '{path}': {message}")]
    InvalidConfig { path: String, message: String },

    #[error("Position {line}:{column} is out of range: {reason}")]
    OutOfRange {
        line: usize,
        column: usize,
        reason: String,
    },

    #[error("Cannot remove {description}: no matching declaration in the script")]
    UnremovableElement { description: String },

    #[error("File '{path}' is busy: another edit is in progress")]
    ResourceBusy { path: String },

    #[error("File '{path}' changed while the edit was computed")]
    PathChanged { path: String },

    #[error("Script has changed since it was read. Expected hash '{expected_hash}', got '{actual_hash}'")]
    PreconditionFailed {
        expected_hash: String,
        actual_hash: String,
    },

    #[error("Tree-sitter language initialization failed: {message}")]
    LanguageSetup { message: String },

    #[error("Provider '{provider}' failed to parse input: {message}")]
    ParseFailure {
        provider: &'static str,
        message: String,
    },
}

impl GradleditError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn unremovable(description: impl Into<String>) -> Self {
        Self::UnremovableElement {
            description: description.into(),
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            Self::InvalidRequest { .. } | Self::InvalidJsonRequest { .. } => {
                ErrorResponse::new("invalid_request", self, None)
            }
            Self::InvalidConfig { .. } => ErrorResponse::new(
                "invalid_config",
                self,
                Some("Supported keys: indent_width, property_namespace"),
            ),
            Self::OutOfRange { .. } => ErrorResponse::new("out_of_range", self, None),
            Self::UnremovableElement { .. } => ErrorResponse::new(
                "unremovable_element",
                self,
                Some("Run 'gradledit read' to list the declarations present in the script"),
            ),
            Self::ResourceBusy { .. } => ErrorResponse::new(
                "resource_busy",
                self,
                Some("Retry after the current edit completes"),
            ),
            Self::PathChanged { .. } => ErrorResponse::new(
                "path_changed",
                self,
                Some("Re-run the command against the current file"),
            ),
            Self::PreconditionFailed { .. } => ErrorResponse::new(
                "precondition_failed",
                self,
                Some("Re-run the command against the current file"),
            ),
            Self::ParseFailure { .. } | Self::LanguageSetup { .. } => {
                ErrorResponse::new("parse_failure", self, None)
            }
            Self::Io { .. } | Self::StdinRead { .. } => ErrorResponse::new("io_error", self, None),
            Self::ResponseSerialization { .. } => {
                ErrorResponse::new("serialization_error", self, None)
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl ErrorResponse {
    fn new(r#type: &str, error: &GradleditError, suggestion: Option<&str>) -> Self {
        Self {
            error: ErrorBody {
                r#type: r#type.to_string(),
                message: error.to_string(),
                suggestion: suggestion.map(str::to_string),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub r#type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}
