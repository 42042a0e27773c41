//! Error types for the Artifact Audit Agent
//!
//! These errors cover the outer surfaces only (arguments, registry loading,
//! serialization). The audit engine itself never propagates errors across
//! its internals: every failure it observes becomes a Reason inside the
//! report, at block or field level.

use thiserror::Error;

/// Main error type for audit operations
#[derive(Error, Debug)]
pub enum AuditError {
    /// Invalid input data or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    FileError(String),

    /// Registry or artifact parsing error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Registry document is structurally unusable
    #[error("Registry error: {0}")]
    RegistryError(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuditError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        AuditError::InvalidInput(msg.into())
    }

    /// Create a file error
    pub fn file_error(msg: impl Into<String>) -> Self {
        AuditError::FileError(msg.into())
    }

    /// Create a parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        AuditError::ParseError(msg.into())
    }

    /// Create a registry error
    pub fn registry_error(msg: impl Into<String>) -> Self {
        AuditError::RegistryError(msg.into())
    }

    /// Check if this is a user-facing error (vs internal)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AuditError::InvalidInput(_)
                | AuditError::FileError(_)
                | AuditError::ParseError(_)
                | AuditError::RegistryError(_)
        )
    }
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        AuditError::FileError(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::ParseError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for AuditError {
    fn from(err: serde_yaml::Error) -> Self {
        AuditError::ParseError(format!("YAML error: {}", err))
    }
}

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;
