//! Error types for living-doc.
//!
//! Library crates use [`LivingDocError`] via `thiserror`.
//! The CLI maps each variant to a process exit code and a
//! `"{prefix} {detail}. {guidance}"` message; anything outside the
//! taxonomy is wrapped with `color-eyre`.

use std::path::PathBuf;

/// Top-level error type for all living-doc operations.
#[derive(Debug, thiserror::Error)]
pub enum LivingDocError {
    /// Malformed or missing input structure (caller's fault).
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// No matching adapter, or the adapter rejected the payload structure.
    #[error("adapter error: {message}")]
    Adapter { message: String },

    /// Failure while parsing or normalizing a specific item's content.
    #[error("normalization error: {message}")]
    Normalization { message: String },

    /// The assembled output failed its own contract. Always a builder bug.
    #[error("schema validation error: {message}")]
    SchemaValidation { message: String },

    /// Filesystem I/O error at the read/write boundary.
    #[error("I/O error at {path:?}: {source}")]
    FileIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration loading error.
    #[error("config error: {message}")]
    Config { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LivingDocError>;

impl LivingDocError {
    /// Create an invalid-input error from any displayable message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Create an adapter error from any displayable message.
    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::Adapter {
            message: msg.into(),
        }
    }

    /// Create a normalization error from any displayable message.
    pub fn normalization(msg: impl Into<String>) -> Self {
        Self::Normalization {
            message: msg.into(),
        }
    }

    /// Create a schema validation error from any displayable message.
    pub fn schema_validation(msg: impl Into<String>) -> Self {
        Self::SchemaValidation {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    /// Prefix run-level context (stage, item id) onto the error detail.
    ///
    /// I/O errors already carry their path and are returned unchanged.
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            Self::InvalidInput { message } => Self::InvalidInput {
                message: format!("{context}: {message}"),
            },
            Self::Adapter { message } => Self::Adapter {
                message: format!("{context}: {message}"),
            },
            Self::Normalization { message } => Self::Normalization {
                message: format!("{context}: {message}"),
            },
            Self::SchemaValidation { message } => Self::SchemaValidation {
                message: format!("{context}: {message}"),
            },
            Self::Config { message } => Self::Config {
                message: format!("{context}: {message}"),
            },
            io @ Self::FileIo { .. } => io,
        }
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput { .. } | Self::Config { .. } => 1,
            Self::Adapter { .. } => 2,
            Self::SchemaValidation { .. } => 3,
            Self::Normalization { .. } => 4,
            Self::FileIo { .. } => 5,
        }
    }

    /// Stable message prefix for this error kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "Invalid input:",
            Self::Adapter { .. } => "Adapter error:",
            Self::Normalization { .. } => "Normalization failed:",
            Self::SchemaValidation { .. } => "Schema validation failed:",
            Self::FileIo { .. } => "File I/O error:",
            Self::Config { .. } => "Configuration error:",
        }
    }

    /// Actionable guidance shown after the detail.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "Ensure --input points to a valid file.",
            Self::Adapter { .. } => "Check metadata.generator.name field.",
            Self::Normalization { .. } => "Check input data format and content.",
            Self::SchemaValidation { .. } => {
                "This is a bug in living-doc, please report it with the input file."
            }
            Self::FileIo { .. } => "Ensure the file exists and the output directory is writable.",
            Self::Config { .. } => "Check the living-doc.toml configuration file.",
        }
    }

    /// The detail without the kind prefix.
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidInput { message }
            | Self::Adapter { message }
            | Self::Normalization { message }
            | Self::SchemaValidation { message }
            | Self::Config { message } => message.clone(),
            Self::FileIo { path, source } => format!("{}: {source}", path.display()),
        }
    }

    /// Full user-facing message: `"{prefix} {detail}. {guidance}"`.
    pub fn user_message(&self) -> String {
        let detail = self.detail();
        let detail = detail.trim_end_matches('.');
        format!("{} {detail}. {}", self.prefix(), self.guidance())
    }
}
