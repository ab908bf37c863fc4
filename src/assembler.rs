// Config Export Builder - Export Assembler
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Turns the registry contents into an export request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{EntityKind, EntityKey};
use crate::registry::Registry;

/// Identifier lists handed to the server's export generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Operator-supplied description of the bundle.
    pub description: String,
    pub event_codes: Vec<u32>,
    pub trap_ids: Vec<u32>,
    pub template_ids: Vec<u32>,
    pub rule_guids: Vec<Uuid>,
    pub script_ids: Vec<u32>,
    pub tool_ids: Vec<u32>,
    pub summary_table_ids: Vec<u32>,
    pub action_ids: Vec<u32>,
    pub web_service_ids: Vec<u32>,
    pub asset_attribute_names: Vec<String>,
}

impl ExportRequest {
    /// True when nothing is selected. Exporting it yields an empty bundle.
    pub fn is_empty(&self) -> bool {
        self.event_codes.is_empty()
            && self.trap_ids.is_empty()
            && self.template_ids.is_empty()
            && self.rule_guids.is_empty()
            && self.script_ids.is_empty()
            && self.tool_ids.is_empty()
            && self.summary_table_ids.is_empty()
            && self.action_ids.is_empty()
            && self.web_service_ids.is_empty()
            && self.asset_attribute_names.is_empty()
    }

    /// Total number of identifiers.
    pub fn len(&self) -> usize {
        self.event_codes.len()
            + self.trap_ids.len()
            + self.template_ids.len()
            + self.rule_guids.len()
            + self.script_ids.len()
            + self.tool_ids.len()
            + self.summary_table_ids.len()
            + self.action_ids.len()
            + self.web_service_ids.len()
            + self.asset_attribute_names.len()
    }
}

fn ids(registry: &Registry, kind: EntityKind) -> Vec<u32> {
    registry
        .snapshot(kind)
        .iter()
        .filter_map(EntityKey::as_id)
        .collect()
}

/// Read the current identifier lists out of `registry`.
pub fn assemble(registry: &Registry, description: &str) -> ExportRequest {
    ExportRequest {
        description: description.to_string(),
        event_codes: ids(registry, EntityKind::Event),
        trap_ids: ids(registry, EntityKind::SnmpTrap),
        template_ids: ids(registry, EntityKind::Template),
        rule_guids: registry
            .snapshot(EntityKind::Rule)
            .iter()
            .filter_map(EntityKey::as_guid)
            .collect(),
        script_ids: ids(registry, EntityKind::Script),
        tool_ids: ids(registry, EntityKind::ObjectTool),
        summary_table_ids: ids(registry, EntityKind::SummaryTable),
        action_ids: ids(registry, EntityKind::Action),
        web_service_ids: ids(registry, EntityKind::WebService),
        asset_attribute_names: registry
            .snapshot(EntityKind::AssetAttribute)
            .iter()
            .filter_map(|key| key.as_name().map(str::to_string))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AssetAttribute, Entity, EventProcessingRule, EventTemplate, Script, Template,
    };

    #[test]
    fn test_empty_registry_gives_empty_request() {
        let request = assemble(&Registry::new(), "nothing");
        assert!(request.is_empty());
        assert_eq!(request.len(), 0);
        assert_eq!(request.description, "nothing");
    }

    #[test]
    fn test_lists_per_kind() {
        let guid = Uuid::new_v4();
        let mut registry = Registry::new();
        registry.add(Entity::Template(Template::new(20, "B")));
        registry.add(Entity::Template(Template::new(10, "A")));
        registry.add(Entity::Event(EventTemplate::new(100_010, "E", "")));
        registry.add(Entity::Rule(EventProcessingRule::new(guid)));
        registry.add(Entity::Script(Script::new(3, "S")));
        registry.add(Entity::AssetAttribute(AssetAttribute {
            name: "serial".to_string(),
            display_name: String::new(),
        }));

        let request = assemble(&registry, "bundle");
        assert_eq!(request.template_ids, vec![10, 20]);
        assert_eq!(request.event_codes, vec![100_010]);
        assert_eq!(request.rule_guids, vec![guid]);
        assert_eq!(request.script_ids, vec![3]);
        assert_eq!(request.asset_attribute_names, vec!["serial".to_string()]);
        assert!(request.trap_ids.is_empty());
        assert_eq!(request.len(), 6);
    }
}
