// Config Export Builder - Entity Kinds
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Uniform view over the exportable object kinds.
//!
//! Every object that can appear in an export bundle is wrapped into an
//! [`Entity`], which knows its [`EntityKind`] and its natural identifier
//! ([`EntityKey`]). The registry and the expander only ever deal with
//! these three types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::objects::{
    AssetAttribute, EventProcessingRule, EventTemplate, ObjectTool, Script, ServerAction,
    SnmpTrap, SummaryTable, Template, TemplateGroup, WebServiceDefinition,
};

/// Exportable object kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Template,
    Event,
    SnmpTrap,
    Rule,
    Script,
    ObjectTool,
    SummaryTable,
    Action,
    WebService,
    AssetAttribute,
}

impl EntityKind {
    /// All kinds, in export order.
    pub fn all() -> &'static [EntityKind] {
        &[
            Self::Template,
            Self::Event,
            Self::SnmpTrap,
            Self::Rule,
            Self::Script,
            Self::ObjectTool,
            Self::SummaryTable,
            Self::Action,
            Self::WebService,
            Self::AssetAttribute,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Event => "event",
            Self::SnmpTrap => "snmp_trap",
            Self::Rule => "rule",
            Self::Script => "script",
            Self::ObjectTool => "object_tool",
            Self::SummaryTable => "summary_table",
            Self::Action => "action",
            Self::WebService => "web_service",
            Self::AssetAttribute => "asset_attribute",
        }
    }

    /// Human-readable plural, used in summaries.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Template => "Templates",
            Self::Event => "Events",
            Self::SnmpTrap => "SNMP Traps",
            Self::Rule => "Rules",
            Self::Script => "Scripts",
            Self::ObjectTool => "Object Tools",
            Self::SummaryTable => "Summary Tables",
            Self::Action => "Actions",
            Self::WebService => "Web Services",
            Self::AssetAttribute => "Asset Attributes",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Natural identifier of an entity within its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    /// Integer object id or event code.
    Id(u32),
    /// Event processing rule GUID.
    Guid(Uuid),
    /// Asset attribute name.
    Name(String),
}

impl EntityKey {
    pub fn as_id(&self) -> Option<u32> {
        match self {
            Self::Id(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Self::Guid(guid) => Some(*guid),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Guid(guid) => write!(f, "{}", guid),
            Self::Name(name) => f.write_str(name),
        }
    }
}

impl From<u32> for EntityKey {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl From<Uuid> for EntityKey {
    fn from(guid: Uuid) -> Self {
        Self::Guid(guid)
    }
}

impl From<&str> for EntityKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

/// Any exportable object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "object", rename_all = "snake_case")]
pub enum Entity {
    Template(Template),
    Event(EventTemplate),
    SnmpTrap(SnmpTrap),
    Rule(EventProcessingRule),
    Script(Script),
    ObjectTool(ObjectTool),
    SummaryTable(SummaryTable),
    Action(ServerAction),
    WebService(WebServiceDefinition),
    AssetAttribute(AssetAttribute),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Template(_) => EntityKind::Template,
            Self::Event(_) => EntityKind::Event,
            Self::SnmpTrap(_) => EntityKind::SnmpTrap,
            Self::Rule(_) => EntityKind::Rule,
            Self::Script(_) => EntityKind::Script,
            Self::ObjectTool(_) => EntityKind::ObjectTool,
            Self::SummaryTable(_) => EntityKind::SummaryTable,
            Self::Action(_) => EntityKind::Action,
            Self::WebService(_) => EntityKind::WebService,
            Self::AssetAttribute(_) => EntityKind::AssetAttribute,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            Self::Template(t) => EntityKey::Id(t.id),
            Self::Event(e) => EntityKey::Id(e.code),
            Self::SnmpTrap(t) => EntityKey::Id(t.id),
            Self::Rule(r) => EntityKey::Guid(r.guid),
            Self::Script(s) => EntityKey::Id(s.id),
            Self::ObjectTool(t) => EntityKey::Id(t.id),
            Self::SummaryTable(t) => EntityKey::Id(t.id),
            Self::Action(a) => EntityKey::Id(a.id),
            Self::WebService(w) => EntityKey::Id(w.id),
            Self::AssetAttribute(a) => EntityKey::Name(a.name.clone()),
        }
    }

    /// Display label for summaries and logs.
    pub fn label(&self) -> String {
        match self {
            Self::Template(t) => t.name.clone(),
            Self::Event(e) => e.name.clone(),
            Self::SnmpTrap(t) => t.oid.clone(),
            Self::Rule(r) => r.comments.clone(),
            Self::Script(s) => s.name.clone(),
            Self::ObjectTool(t) => t.name.clone(),
            Self::SummaryTable(t) => t.title.clone(),
            Self::Action(a) => a.name.clone(),
            Self::WebService(w) => w.name.clone(),
            Self::AssetAttribute(a) => a.name.clone(),
        }
    }
}

/// Template selection entry: a single template or a whole group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSelection {
    Template(Template),
    Group(TemplateGroup),
}

/// Operator selection of root objects for one kind.
///
/// Traps, rules and actions are picked from server-side lists, so they are
/// selected by identifier and resolved against the cached list. The other
/// kinds come fully populated from their selection dialogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSelection {
    Templates(Vec<TemplateSelection>),
    Events(Vec<EventTemplate>),
    SnmpTraps(Vec<u32>),
    Rules(Vec<Uuid>),
    Scripts(Vec<Script>),
    ObjectTools(Vec<ObjectTool>),
    SummaryTables(Vec<SummaryTable>),
    Actions(Vec<u32>),
    WebServices(Vec<WebServiceDefinition>),
    AssetAttributes(Vec<AssetAttribute>),
}

impl RootSelection {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Templates(_) => EntityKind::Template,
            Self::Events(_) => EntityKind::Event,
            Self::SnmpTraps(_) => EntityKind::SnmpTrap,
            Self::Rules(_) => EntityKind::Rule,
            Self::Scripts(_) => EntityKind::Script,
            Self::ObjectTools(_) => EntityKind::ObjectTool,
            Self::SummaryTables(_) => EntityKind::SummaryTable,
            Self::Actions(_) => EntityKind::Action,
            Self::WebServices(_) => EntityKind::WebService,
            Self::AssetAttributes(_) => EntityKind::AssetAttribute,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Templates(v) => v.is_empty(),
            Self::Events(v) => v.is_empty(),
            Self::SnmpTraps(v) => v.is_empty(),
            Self::Rules(v) => v.is_empty(),
            Self::Scripts(v) => v.is_empty(),
            Self::ObjectTools(v) => v.is_empty(),
            Self::SummaryTables(v) => v.is_empty(),
            Self::Actions(v) => v.is_empty(),
            Self::WebServices(v) => v.is_empty(),
            Self::AssetAttributes(v) => v.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_and_key() {
        let guid = Uuid::new_v4();
        let rule = Entity::Rule(EventProcessingRule::new(guid));
        assert_eq!(rule.kind(), EntityKind::Rule);
        assert_eq!(rule.key(), EntityKey::Guid(guid));

        let attr = Entity::AssetAttribute(AssetAttribute {
            name: "serial".to_string(),
            display_name: "Serial number".to_string(),
        });
        assert_eq!(attr.key(), EntityKey::from("serial"));

        let event = Entity::Event(EventTemplate::new(100_010, "SYS_X", ""));
        assert_eq!(event.key().as_id(), Some(100_010));
    }

    #[test]
    fn test_all_kinds_listed_once() {
        let mut kinds = EntityKind::all().to_vec();
        kinds.dedup();
        assert_eq!(kinds.len(), 10);
    }
}
