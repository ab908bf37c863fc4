// Config Export Builder - Management Session
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Remote management session interface.
//!
//! The export builder only needs a handful of server queries. They are
//! collected in [`ManagementSession`] so the wire protocol stays outside
//! this crate; [`SnapshotSession`] answers them from a server snapshot file.

mod snapshot;

pub use snapshot::{ServerSnapshot, SnapshotSession, TemplateDetails};

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::assembler::ExportRequest;
use crate::models::{
    AgentPolicy, EventProcessingRule, EventTemplate, Repository, Result, Script, ServerAction,
    SnmpTrap,
};

/// Queries issued against the management server.
#[async_trait]
pub trait ManagementSession: Send + Sync {
    /// All scripts in the script library (id and name only).
    async fn list_library_scripts(&self) -> Result<Vec<Script>>;

    /// Event definitions for the given codes. Unknown codes are skipped.
    async fn find_event_definitions(&self, codes: &BTreeSet<u32>) -> Result<Vec<EventTemplate>>;

    /// Event codes a template can generate.
    async fn related_event_codes(&self, template_id: u32) -> Result<Vec<u32>>;

    /// Library scripts used by a template's data collection items.
    async fn data_collection_scripts(&self, template_id: u32) -> Result<Vec<Script>>;

    /// Agent policies attached to a template.
    async fn agent_policies(&self, template_id: u32) -> Result<Vec<AgentPolicy>>;

    /// All server actions.
    async fn list_actions(&self) -> Result<Vec<ServerAction>>;

    /// SNMP trap mapping summaries.
    async fn list_trap_summaries(&self) -> Result<Vec<SnmpTrap>>;

    /// Rules of the event processing policy.
    async fn event_processing_rules(&self) -> Result<Vec<EventProcessingRule>>;

    /// Generate the export bundle for the given identifiers.
    async fn export_configuration(&self, request: &ExportRequest) -> Result<String>;

    /// Configuration repositories known to the server.
    async fn list_repositories(&self) -> Result<Vec<Repository>>;
}
