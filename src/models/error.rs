// Config Export Builder - Error Types
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Shared error types for the export builder.

use thiserror::Error;

/// Result type alias for export builder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for export builder operations.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================
    // Session Errors
    // ========================================
    #[error("Session query failed: {operation} - {reason}")]
    FetchFailed { operation: String, reason: String },

    #[error("Unknown {kind}: {key}")]
    UnknownObject { kind: String, key: String },

    // ========================================
    // Export Errors
    // ========================================
    #[error("Cannot export configuration: {0}")]
    ExportFailed(String),

    #[error("Export view has been closed")]
    ViewClosed,

    // ========================================
    // Publish Errors
    // ========================================
    #[error("Cannot publish configuration to repository: {0}")]
    PublishFailed(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(i32),

    #[error("HTTP error: {0}")]
    Http(String),

    // ========================================
    // Storage Errors
    // ========================================
    #[error("Failed to write configuration: {0}")]
    ConfigWriteFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParseFailed(String),

    #[error("Incompatible snapshot schema: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    // ========================================
    // System Errors
    // ========================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========================================
    // Generic Errors
    // ========================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new fetch failed error.
    pub fn fetch_failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FetchFailed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unknown object error.
    pub fn unknown_object(kind: impl Into<String>, key: impl ToString) -> Self {
        Self::UnknownObject {
            kind: kind.into(),
            key: key.to_string(),
        }
    }

    /// Check if the operator can retry by repeating the same action.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::FetchFailed { .. } | Self::Http(_)
        )
    }

    /// Check if this error came from bundle generation.
    pub fn is_export_failure(&self) -> bool {
        matches!(self, Self::ExportFailed(_))
    }
}

// Convert from toml parse errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}

// Convert from toml serialize errors
impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::ConfigWriteFailed(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParseFailed(err.to_string())
    }
}

// Convert from reqwest errors
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_is_transient() {
        let err = Error::fetch_failed("listActions", "connection reset");
        assert!(err.is_transient());
        assert!(!err.is_export_failure());
        assert_eq!(
            err.to_string(),
            "Session query failed: listActions - connection reset"
        );
    }

    #[test]
    fn test_export_failure_is_not_transient() {
        let err = Error::ExportFailed("access denied".to_string());
        assert!(err.is_export_failure());
        assert!(!err.is_transient());
    }
}
