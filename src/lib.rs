// Config Export Builder - Library Root
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Config Export Builder
//!
//! Builds the dependency closure of a network-monitoring configuration
//! export. The operator picks root objects (templates, events, SNMP traps,
//! rules and so on); the builder pulls in the user-defined events, server
//! actions and library scripts they depend on, then hands the complete
//! identifier lists to the server's export generator.
//!
//! [`builder::ExportBuilder`] is the entry point.

pub mod assembler;
pub mod builder;
pub mod expander;
pub mod models;
pub mod orchestrator;
pub mod publish;
pub mod registry;
pub mod scanner;
pub mod session;
pub mod storage;

pub use builder::{BuilderEvent, ExportBuilder, RoundHandle};
pub use models::{Error, Result};

/// Package name, used in the HTTP user agent.
pub const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

/// Human-readable application name.
pub const APP_NAME: &str = "Config Export Builder";

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
