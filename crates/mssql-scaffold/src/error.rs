//! Error types for the scaffold library.

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for database connection or query errors.
pub const EXIT_SOURCE_ERROR: u8 = 2;
/// Exit code for catalog extraction errors.
pub const EXIT_SCHEMA_ERROR: u8 = 3;
/// Exit code for code generation errors.
pub const EXIT_GENERATION_ERROR: u8 = 4;
/// Exit code for filesystem errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Exit code when the run was interrupted.
pub const EXIT_CANCELLED: u8 = 130;

/// Main error type for scaffold operations.
#[derive(Error, Debug)]
pub enum ScaffoldError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configured database provider has no introspector.
    #[error("Database provider '{0}' is not supported (supported: sqlserver)")]
    UnsupportedProvider(String),

    /// Source database connection or query error
    #[error("Source database error: {0}")]
    Source(#[from] tiberius::error::Error),

    /// Connection error with context
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Catalog extraction failed
    #[error("Schema extraction failed: {0}")]
    SchemaExtraction(String),

    /// Rendering a migration file failed
    #[error("Code generation failed for {file}: {message}")]
    Generation { file: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scaffolding was cancelled (SIGINT, etc.)
    #[error("Scaffold cancelled")]
    Cancelled,
}

impl ScaffoldError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl std::fmt::Display, context: impl Into<String>) -> Self {
        ScaffoldError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Generation error
    pub fn generation(file: impl Into<String>, message: impl Into<String>) -> Self {
        ScaffoldError::Generation {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScaffoldError::Config(_)
            | ScaffoldError::UnsupportedProvider(_)
            | ScaffoldError::Yaml(_) => EXIT_CONFIG_ERROR,
            ScaffoldError::Source(_) | ScaffoldError::Connection { .. } => EXIT_SOURCE_ERROR,
            ScaffoldError::SchemaExtraction(_) => EXIT_SCHEMA_ERROR,
            ScaffoldError::Generation { .. } | ScaffoldError::Json(_) => EXIT_GENERATION_ERROR,
            ScaffoldError::Io(_) => EXIT_IO_ERROR,
            ScaffoldError::Cancelled => EXIT_CANCELLED,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for scaffold operations.
pub type Result<T> = std::result::Result<T, ScaffoldError>;
