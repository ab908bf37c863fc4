// Config Export Builder - Local Storage
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Local storage for settings and saved bundles.
//!
//! Settings live in `settings.toml` under the user's config directory.
//! This module uses RwLock for thread-safe access. Lock poisoning is handled
//! by recovering the inner value.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{error, info, warn};

use crate::models::{AppConfig, Result, CONFIG_DIR_NAME};

const SETTINGS_FILE_NAME: &str = "settings.toml";

/// Local data store for the export builder.
#[derive(Debug)]
pub struct DataStore {
    /// Settings file path.
    settings_file: PathBuf,
    /// Application settings.
    settings: RwLock<AppConfig>,
}

impl DataStore {
    /// Create a data store in the default config directory.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME);
        Self::with_config_dir(config_dir)
    }

    /// Create a data store in a specific config directory.
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&config_dir) {
            error!("Failed to create config directory: {}", e);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&config_dir, fs::Permissions::from_mode(0o700));
        }

        let store = Self {
            settings_file: config_dir.join(SETTINGS_FILE_NAME),
            settings: RwLock::new(AppConfig::default()),
        };
        store.load_settings();
        store
    }

    // ========================================================================
    // Settings
    // ========================================================================

    fn load_settings(&self) {
        if !self.settings_file.exists() {
            return;
        }
        match AppConfig::load_from_file(&self.settings_file) {
            Ok(config) => {
                match self.settings.write() {
                    Ok(mut guard) => *guard = config,
                    Err(poisoned) => {
                        warn!("RwLock poisoned writing settings, recovering");
                        *poisoned.into_inner() = config;
                    }
                }
                info!("Loaded settings from {:?}", self.settings_file);
            }
            Err(e) => {
                error!("Failed to load settings: {}", e);
            }
        }
    }

    /// Get the current settings.
    pub fn settings(&self) -> AppConfig {
        match self.settings.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                warn!("RwLock poisoned reading settings, recovering");
                poisoned.into_inner().clone()
            }
        }
    }

    /// Replace the settings and persist them.
    pub fn update_settings(&self, settings: AppConfig) -> Result<()> {
        settings.save_to_file(&self.settings_file)?;
        match self.settings.write() {
            Ok(mut guard) => *guard = settings,
            Err(poisoned) => {
                warn!("RwLock poisoned writing settings, recovering");
                *poisoned.into_inner() = settings;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Bundles
    // ========================================================================

    /// Where to save a bundle when no path was given.
    pub fn default_export_path(&self) -> PathBuf {
        PathBuf::from(self.settings().default_export_file)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Write an export bundle, replacing any existing file.
pub fn write_bundle(path: &Path, bundle: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bundle.as_bytes())?;
    writer.flush()?;
    info!("Saved export bundle to {:?} ({} bytes)", path, bundle.len());
    Ok(())
}
