//! Error types for Pangea.

use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Result type alias for Pangea operations.
pub type PangeaResult<T> = Result<T, PangeaError>;

/// Errors that can occur while building or synthesizing resources.
#[derive(Error, Debug)]
pub enum PangeaError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Invalid attributes for {resource_type}: {message}")]
    InvalidAttributes {
        resource_type: String,
        message: String,
    },

    #[error("Invalid resource name '{name}': {message}")]
    InvalidResourceName { name: String, message: String },

    #[error("Resource already declared: {0}")]
    DuplicateResource(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Unsupported template format: {0}")]
    UnsupportedTemplateFormat(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PangeaError {
    /// Create an invalid attributes error for a resource type.
    pub fn invalid_attributes(resource_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttributes {
            resource_type: resource_type.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors raised while validating attributes.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PangeaError::Validation(_)
                | PangeaError::InvalidAttributes { .. }
                | PangeaError::InvalidResourceName { .. }
        )
    }

    /// Access structured validation details, if any.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            PangeaError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for PangeaError {
    fn from(errors: ValidationErrors) -> Self {
        PangeaError::Validation(errors)
    }
}
