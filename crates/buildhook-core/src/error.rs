//! Error types for Buildhook

use thiserror::Error;

use crate::notify::{DeliveryError, ValidationError};

/// Result type alias using Buildhook's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Buildhook operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required host handle or setting is missing
    #[error("Configuration error: {0}")]
    Config(String),

    /// A static asset could not be loaded at startup
    #[error("Resource error: {0}")]
    Resource(String),

    /// Template evaluation failed
    #[error("{message}")]
    Render {
        /// Diagnostic message, including the effective template
        message: String,
        /// Engine error
        #[source]
        source: minijinja::Error,
    },

    /// Rendered text is not an acceptable JSON payload
    #[error("{message}")]
    Validation {
        /// Diagnostic message, including the rendered text
        message: String,
        /// Failed check
        #[source]
        source: ValidationError,
    },

    /// The webhook could not be reached or answered with a status other than 200
    #[error("{message}")]
    Delivery {
        /// Diagnostic message, including the destination and payload
        message: String,
        /// Transport or status failure
        #[source]
        source: DeliveryError,
    },
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a resource error
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Underlying cause, rendered for a log line
    pub fn cause(&self) -> Option<String> {
        match self {
            Self::Render { source, .. } => Some(source.to_string()),
            Self::Validation { source, .. } => Some(source.to_string()),
            Self::Delivery { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}

impl From<::config::ConfigError> for Error {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
