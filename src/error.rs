use std::path::PathBuf;
use thiserror::Error;

/// Docsmith error types
///
/// Every variant is fatal: it aborts the run. Non-fatal findings go to
/// [`crate::diagnostics::Diagnostics`] instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Search location not found: {0}")]
    LocationNotFound(PathBuf),

    #[error("Load error in {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Processor '{processor}' failed: {message}")]
    Processor { processor: String, message: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Parser error: {0}")]
    Parser(String),
}

/// Result type alias for Docsmith operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a load error for a source artifact
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a processor error
    pub fn processor(processor: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Processor {
            processor: processor.into(),
            message: message.into(),
        }
    }

    /// Create a render error
    pub fn render(msg: impl Into<String>) -> Self {
        Error::Render(msg.into())
    }

    /// Create a parser error
    pub fn parser(msg: impl Into<String>) -> Self {
        Error::Parser(msg.into())
    }

    /// Whether this error came from the loading stage
    pub fn is_load_error(&self) -> bool {
        matches!(self, Error::Load { .. } | Error::LocationNotFound(_))
    }

    /// Whether this error came from configuration validation
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::ConfigParse(_))
    }
}
