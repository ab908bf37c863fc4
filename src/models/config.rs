// Config Export Builder - Application Configuration
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Application configuration model.

use serde::{Deserialize, Serialize};

use super::FIRST_USER_EVENT_CODE;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Lowest event code treated as user-defined.
    ///
    /// Codes below this value are built-in events that exist on every
    /// server and are never exported.
    #[serde(default = "default_system_event_threshold")]
    pub system_event_threshold: u32,

    /// File name suggested when saving an export.
    #[serde(default = "default_export_file")]
    pub default_export_file: String,

    /// Resolve dependencies when roots are added.
    #[serde(default = "default_true")]
    pub resolve_dependencies: bool,

    /// Timeout for repository publish requests.
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_secs: u64,

    /// Largest repository response body accepted.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_system_event_threshold() -> u32 {
    FIRST_USER_EVENT_CODE
}

fn default_export_file() -> String {
    "export.xml".to_string()
}

fn default_true() -> bool {
    true
}

fn default_publish_timeout() -> u64 {
    30
}

fn default_max_response_bytes() -> usize {
    512 * 1024
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            system_event_threshold: default_system_event_threshold(),
            default_export_file: default_export_file(),
            resolve_dependencies: true,
            publish_timeout_secs: default_publish_timeout(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, super::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file with restrictive permissions (0600).
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), super::Error> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
        }
        Ok(())
    }
}
