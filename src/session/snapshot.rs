// Config Export Builder - Snapshot Session
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Session backed by a server snapshot file.
//!
//! The snapshot is a JSON document holding the server objects the export
//! builder queries. Calls are counted per operation, and individual
//! operations can be made to fail, which is how dry runs and tests
//! exercise the builder without a live server.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ManagementSession;
use crate::assembler::ExportRequest;
use crate::models::{
    AgentPolicy, AssetAttribute, Error, EventProcessingRule, EventTemplate, ObjectTool,
    Repository, Result, SchemaVersion, Script, ServerAction, SnmpTrap, SummaryTable, Template,
    TemplateGroup, WebServiceDefinition,
};

/// Per-template data the server computes on request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDetails {
    pub template: Template,
    /// Event codes the template's items and thresholds can generate.
    #[serde(default)]
    pub related_events: Vec<u32>,
    /// Library script ids used by data collection items.
    #[serde(default)]
    pub data_collection_scripts: Vec<u32>,
    #[serde(default)]
    pub policies: Vec<AgentPolicy>,
}

/// Server objects available to a [`SnapshotSession`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSnapshot {
    #[serde(default)]
    pub schema_version: SchemaVersion,
    #[serde(default)]
    pub templates: Vec<TemplateDetails>,
    #[serde(default)]
    pub template_groups: Vec<TemplateGroup>,
    #[serde(default)]
    pub events: Vec<EventTemplate>,
    #[serde(default)]
    pub traps: Vec<SnmpTrap>,
    #[serde(default)]
    pub rules: Vec<EventProcessingRule>,
    #[serde(default)]
    pub scripts: Vec<Script>,
    #[serde(default)]
    pub tools: Vec<ObjectTool>,
    #[serde(default)]
    pub summary_tables: Vec<SummaryTable>,
    #[serde(default)]
    pub actions: Vec<ServerAction>,
    #[serde(default)]
    pub web_services: Vec<WebServiceDefinition>,
    #[serde(default)]
    pub asset_attributes: Vec<AssetAttribute>,
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

impl ServerSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Self = serde_json::from_reader(reader)?;
        snapshot.schema_version.ensure_compatible()?;
        info!(
            "Loaded server snapshot from {:?}: {} templates, {} events, {} scripts",
            path,
            snapshot.templates.len(),
            snapshot.events.len(),
            snapshot.scripts.len()
        );
        Ok(snapshot)
    }

    pub fn template(&self, id: u32) -> Option<&TemplateDetails> {
        self.templates.iter().find(|t| t.template.id == id)
    }

    /// Find a group at any nesting depth.
    pub fn template_group(&self, id: u32) -> Option<&TemplateGroup> {
        fn find(groups: &[TemplateGroup], id: u32) -> Option<&TemplateGroup> {
            groups
                .iter()
                .find_map(|g| if g.id == id { Some(g) } else { find(&g.groups, id) })
        }
        find(&self.template_groups, id)
    }

    pub fn event(&self, code: u32) -> Option<&EventTemplate> {
        self.events.iter().find(|e| e.code == code)
    }

    pub fn script(&self, id: u32) -> Option<&Script> {
        self.scripts.iter().find(|s| s.id == id)
    }

    pub fn tool(&self, id: u32) -> Option<&ObjectTool> {
        self.tools.iter().find(|t| t.id == id)
    }

    pub fn summary_table(&self, id: u32) -> Option<&SummaryTable> {
        self.summary_tables.iter().find(|t| t.id == id)
    }

    pub fn web_service(&self, id: u32) -> Option<&WebServiceDefinition> {
        self.web_services.iter().find(|w| w.id == id)
    }

    pub fn asset_attribute(&self, name: &str) -> Option<&AssetAttribute> {
        self.asset_attributes.iter().find(|a| a.name == name)
    }
}

/// [`ManagementSession`] answering from a [`ServerSnapshot`].
#[derive(Debug, Default)]
pub struct SnapshotSession {
    snapshot: ServerSnapshot,
    calls: Mutex<HashMap<&'static str, usize>>,
    history: Mutex<Vec<&'static str>>,
    failing: Mutex<HashSet<&'static str>>,
    latency: Option<Duration>,
}

impl SnapshotSession {
    pub fn new(snapshot: ServerSnapshot) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Load the snapshot file and wrap it in a session.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(ServerSnapshot::load_from_file(path)?))
    }

    /// Delay every query by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn snapshot(&self) -> &ServerSnapshot {
        &self.snapshot
    }

    /// Make `operation` fail until [`SnapshotSession::recover`] is called.
    pub fn fail_operation(&self, operation: &'static str) {
        lock(&self.failing).insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        lock(&self.failing).remove(operation);
    }

    /// Number of times `operation` has been called.
    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.calls).get(operation).copied().unwrap_or(0)
    }

    /// Operations in the order they were called.
    pub fn history(&self) -> Vec<&'static str> {
        lock(&self.history).clone()
    }

    async fn begin(&self, operation: &'static str) -> Result<()> {
        *lock(&self.calls).entry(operation).or_insert(0) += 1;
        lock(&self.history).push(operation);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if lock(&self.failing).contains(operation) {
            return Err(Error::fetch_failed(operation, "request rejected by server"));
        }
        debug!("Snapshot session: {}", operation);
        Ok(())
    }

    fn template_details(&self, operation: &'static str, id: u32) -> Result<&TemplateDetails> {
        self.snapshot
            .template(id)
            .ok_or_else(|| Error::fetch_failed(operation, format!("invalid object id {}", id)))
    }

    fn render_bundle(&self, request: &ExportRequest) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<configuration>\n");
        xml.push_str(&format!(
            "  <description>{}</description>\n",
            escape_xml(&request.description)
        ));
        xml.push_str(&format!(
            "  <exported>{}</exported>\n",
            chrono::Utc::now().to_rfc3339()
        ));

        section(&mut xml, "events", "event", request.event_codes.iter().map(|code| {
            let name = self.snapshot.event(*code).map(|e| e.name.as_str()).unwrap_or("");
            (code.to_string(), name.to_string())
        }));
        section(&mut xml, "templates", "template", request.template_ids.iter().map(|id| {
            let name = self
                .snapshot
                .template(*id)
                .map(|t| t.template.name.as_str())
                .unwrap_or("");
            (id.to_string(), name.to_string())
        }));
        section(&mut xml, "traps", "trap", request.trap_ids.iter().map(|id| {
            let oid = self
                .snapshot
                .traps
                .iter()
                .find(|t| t.id == *id)
                .map(|t| t.oid.as_str())
                .unwrap_or("");
            (id.to_string(), oid.to_string())
        }));
        section(&mut xml, "rules", "rule", request.rule_guids.iter().map(|guid| {
            let comments = self
                .snapshot
                .rules
                .iter()
                .find(|r| r.guid == *guid)
                .map(|r| r.comments.as_str())
                .unwrap_or("");
            (guid.to_string(), comments.to_string())
        }));
        section(&mut xml, "scripts", "script", request.script_ids.iter().map(|id| {
            let name = self.snapshot.script(*id).map(|s| s.name.as_str()).unwrap_or("");
            (id.to_string(), name.to_string())
        }));
        section(&mut xml, "objectTools", "objectTool", request.tool_ids.iter().map(|id| {
            let name = self.snapshot.tool(*id).map(|t| t.name.as_str()).unwrap_or("");
            (id.to_string(), name.to_string())
        }));
        section(&mut xml, "dciSummaryTables", "table", request.summary_table_ids.iter().map(|id| {
            let title = self
                .snapshot
                .summary_table(*id)
                .map(|t| t.title.as_str())
                .unwrap_or("");
            (id.to_string(), title.to_string())
        }));
        section(&mut xml, "actions", "action", request.action_ids.iter().map(|id| {
            let name = self
                .snapshot
                .actions
                .iter()
                .find(|a| a.id == *id)
                .map(|a| a.name.as_str())
                .unwrap_or("");
            (id.to_string(), name.to_string())
        }));
        section(&mut xml, "webServiceDefinitions", "webServiceDefinition", request.web_service_ids.iter().map(|id| {
            let name = self.snapshot.web_service(*id).map(|w| w.name.as_str()).unwrap_or("");
            (id.to_string(), name.to_string())
        }));
        section(&mut xml, "assetManagementSchema", "attribute", request.asset_attribute_names.iter().map(|name| {
            let display = self
                .snapshot
                .asset_attribute(name)
                .map(|a| a.display_name.as_str())
                .unwrap_or("");
            (name.clone(), display.to_string())
        }));

        xml.push_str("</configuration>\n");
        xml
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn section<I>(xml: &mut String, name: &str, item: &str, entries: I)
where
    I: Iterator<Item = (String, String)>,
{
    xml.push_str(&format!("  <{}>\n", name));
    for (id, label) in entries {
        xml.push_str(&format!(
            "    <{} id=\"{}\">{}</{}>\n",
            item,
            escape_xml(&id),
            escape_xml(&label),
            item
        ));
    }
    xml.push_str(&format!("  </{}>\n", name));
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[async_trait]
impl ManagementSession for SnapshotSession {
    async fn list_library_scripts(&self) -> Result<Vec<Script>> {
        self.begin("listLibraryScripts").await?;
        Ok(self.snapshot.scripts.clone())
    }

    async fn find_event_definitions(&self, codes: &BTreeSet<u32>) -> Result<Vec<EventTemplate>> {
        self.begin("findEventDefinitions").await?;
        Ok(self
            .snapshot
            .events
            .iter()
            .filter(|e| codes.contains(&e.code))
            .cloned()
            .collect())
    }

    async fn related_event_codes(&self, template_id: u32) -> Result<Vec<u32>> {
        self.begin("relatedEventCodes").await?;
        Ok(self
            .template_details("relatedEventCodes", template_id)?
            .related_events
            .clone())
    }

    async fn data_collection_scripts(&self, template_id: u32) -> Result<Vec<Script>> {
        self.begin("dataCollectionScripts").await?;
        let details = self.template_details("dataCollectionScripts", template_id)?;
        Ok(details
            .data_collection_scripts
            .iter()
            .filter_map(|id| self.snapshot.script(*id).cloned())
            .collect())
    }

    async fn agent_policies(&self, template_id: u32) -> Result<Vec<AgentPolicy>> {
        self.begin("agentPolicies").await?;
        Ok(self
            .template_details("agentPolicies", template_id)?
            .policies
            .clone())
    }

    async fn list_actions(&self) -> Result<Vec<ServerAction>> {
        self.begin("listActions").await?;
        Ok(self.snapshot.actions.clone())
    }

    async fn list_trap_summaries(&self) -> Result<Vec<SnmpTrap>> {
        self.begin("listTrapSummaries").await?;
        Ok(self.snapshot.traps.clone())
    }

    async fn event_processing_rules(&self) -> Result<Vec<EventProcessingRule>> {
        self.begin("eventProcessingRules").await?;
        Ok(self.snapshot.rules.clone())
    }

    async fn export_configuration(&self, request: &ExportRequest) -> Result<String> {
        self.begin("exportConfiguration")
            .await
            .map_err(|e| Error::ExportFailed(e.to_string()))?;
        Ok(self.render_bundle(request))
    }

    async fn list_repositories(&self) -> Result<Vec<Repository>> {
        self.begin("listRepositories").await?;
        Ok(self.snapshot.repositories.clone())
    }
}
