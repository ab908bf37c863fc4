// Config Export Builder - Data Models
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Data Models
//!
//! Shared types used by every part of the export builder:
//!
//! - **Objects**: configuration objects as delivered by the server
//! - **Entity**: uniform kind/key view over those objects
//! - **Config**: application settings
//! - **Schema**: snapshot file versioning
//! - **Error**: shared error types

pub mod config;
pub mod entity;
pub mod error;
pub mod objects;
pub mod schema;

pub use config::AppConfig;
pub use entity::{Entity, EntityKey, EntityKind, RootSelection, TemplateSelection};
pub use error::{Error, Result};
pub use objects::{
    ActionExecution, AgentPolicy, AssetAttribute, EventProcessingRule, EventTemplate, ObjectTool,
    Repository, Script, ServerAction, SnmpTrap, SummaryTable, Template, TemplateGroup,
    WebServiceDefinition,
};
pub use schema::SchemaVersion;

/// First event code available for user-defined events.
///
/// Codes below this value are reserved for built-in system events.
pub const FIRST_USER_EVENT_CODE: u32 = 100_000;

/// Configuration directory name (under XDG_CONFIG_HOME).
pub const CONFIG_DIR_NAME: &str = "config-export-builder";
