// Config Export Builder - Schema Versioning
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Schema version of server snapshot files.

use semver::Version;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Current schema version for snapshot files.
pub const SNAPSHOT_SCHEMA_VERSION: &str = "1.0.0";

/// Schema version wrapper for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn current() -> Self {
        Self(SNAPSHOT_SCHEMA_VERSION.to_string())
    }

    /// Readable when the major version matches and the minor is not newer.
    pub fn is_compatible(&self) -> bool {
        match (Version::parse(&self.0), Version::parse(SNAPSHOT_SCHEMA_VERSION)) {
            (Ok(this), Ok(current)) => this.major == current.major && this.minor <= current.minor,
            _ => false,
        }
    }

    /// Fail with [`Error::SchemaMismatch`] unless compatible.
    pub fn ensure_compatible(&self) -> Result<()> {
        if self.is_compatible() {
            Ok(())
        } else {
            Err(Error::SchemaMismatch {
                expected: SNAPSHOT_SCHEMA_VERSION.to_string(),
                found: self.0.clone(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_is_compatible() {
        assert!(SchemaVersion::current().is_compatible());
        assert!(SchemaVersion::current().ensure_compatible().is_ok());
    }

    #[test]
    fn test_major_bump_rejected() {
        let err = SchemaVersion::new("2.0.0").ensure_compatible().unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
        assert!(!SchemaVersion::new("not-a-version").is_compatible());
    }
}
