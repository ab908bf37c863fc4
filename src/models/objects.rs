// Config Export Builder - Server Objects
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Configuration objects as delivered by the management server.
//!
//! These are plain data carriers. Only the fields that matter for
//! dependency resolution and for identifying an object in the export
//! bundle are modelled; everything else stays on the server.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Agent policy type that carries agent configuration text.
pub const AGENT_CONFIG_POLICY_TYPE: &str = "AgentConfig";

/// Agent policy flag: expand macros in policy content before deployment.
pub const POLICY_FLAG_EXPAND_MACRO: u32 = 0x0001;

/// Data collection template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Object identifier.
    pub id: u32,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

impl Template {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Template group, possibly nested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateGroup {
    /// Object identifier.
    pub id: u32,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Templates directly below this group.
    #[serde(default)]
    pub templates: Vec<Template>,
    /// Nested groups.
    #[serde(default)]
    pub groups: Vec<TemplateGroup>,
}

impl TemplateGroup {
    /// All templates below this group, at any depth.
    pub fn all_templates(&self) -> Vec<Template> {
        let mut result = self.templates.clone();
        for group in &self.groups {
            result.extend(group.all_templates());
        }
        result
    }
}

/// Event definition (event template).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTemplate {
    /// Event code.
    pub code: u32,
    /// Event name.
    #[serde(default)]
    pub name: String,
    /// Message text, may contain macro references.
    #[serde(default)]
    pub message: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

impl EventTemplate {
    pub fn new(code: u32, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            message: message.into(),
            description: String::new(),
        }
    }
}

/// SNMP trap mapping (summary form).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnmpTrap {
    /// Trap mapping identifier.
    pub id: u32,
    /// Trap OID.
    #[serde(default)]
    pub oid: String,
    /// Event generated when the trap is received.
    pub event_code: u32,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Action execution entry of an event processing rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionExecution {
    /// Server action to execute.
    pub action_id: u32,
    /// Delay before execution, in seconds.
    #[serde(default)]
    pub timer_delay: u32,
    /// Key of the delay timer.
    #[serde(default)]
    pub timer_key: String,
    /// Key of the timer that blocks repeated execution.
    #[serde(default)]
    pub blocking_timer_key: String,
}

/// Event processing policy rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventProcessingRule {
    /// Rule GUID.
    pub guid: Uuid,
    /// Operator comments.
    #[serde(default)]
    pub comments: String,
    /// Event codes matched by the rule.
    #[serde(default)]
    pub events: Vec<u32>,
    /// Actions executed when the rule matches.
    #[serde(default)]
    pub actions: Vec<ActionExecution>,
    #[serde(default)]
    pub alarm_key: String,
    #[serde(default)]
    pub alarm_message: String,
    #[serde(default)]
    pub downtime_tag: String,
    /// Persistent storage entries to set (key to value).
    #[serde(default)]
    pub persistent_storage_set: BTreeMap<String, String>,
    /// Persistent storage keys to delete.
    #[serde(default)]
    pub persistent_storage_delete: Vec<String>,
    /// Custom attributes to set (name to value).
    #[serde(default)]
    pub custom_attribute_set: BTreeMap<String, String>,
    /// Custom attributes to delete.
    #[serde(default)]
    pub custom_attribute_delete: Vec<String>,
    /// Timer keys to cancel.
    #[serde(default)]
    pub timer_cancellations: Vec<String>,
}

impl EventProcessingRule {
    /// Create an empty rule with the given GUID.
    pub fn new(guid: Uuid) -> Self {
        Self {
            guid,
            comments: String::new(),
            events: Vec::new(),
            actions: Vec::new(),
            alarm_key: String::new(),
            alarm_message: String::new(),
            downtime_tag: String::new(),
            persistent_storage_set: BTreeMap::new(),
            persistent_storage_delete: Vec::new(),
            custom_attribute_set: BTreeMap::new(),
            custom_attribute_delete: Vec::new(),
            timer_cancellations: Vec::new(),
        }
    }

    /// Every free-text field that may carry macro references.
    pub fn text_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.alarm_key.as_str(),
            self.alarm_message.as_str(),
            self.downtime_tag.as_str(),
        ];
        for (key, value) in &self.persistent_storage_set {
            fields.push(key);
            fields.push(value);
        }
        fields.extend(self.persistent_storage_delete.iter().map(String::as_str));
        for (name, value) in &self.custom_attribute_set {
            fields.push(name);
            fields.push(value);
        }
        fields.extend(self.custom_attribute_delete.iter().map(String::as_str));
        for action in &self.actions {
            fields.push(&action.timer_key);
            fields.push(&action.blocking_timer_key);
        }
        fields.extend(self.timer_cancellations.iter().map(String::as_str));
        fields
    }
}

/// Library script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Script identifier.
    pub id: u32,
    /// Script name, referenced from macros.
    pub name: String,
}

impl Script {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Object tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTool {
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

/// DCI summary table descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub id: u32,
    #[serde(default)]
    pub title: String,
}

/// Server action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAction {
    /// Action identifier.
    pub id: u32,
    #[serde(default)]
    pub name: String,
    /// E-mail subject (or notification subject).
    #[serde(default)]
    pub email_subject: String,
    /// Action payload: message body, command line, script text.
    #[serde(default)]
    pub data: String,
    /// Recipient address.
    #[serde(default)]
    pub recipient_address: String,
}

impl ServerAction {
    /// Every free-text field that may carry macro references.
    pub fn text_fields(&self) -> [&str; 3] {
        [
            self.email_subject.as_str(),
            self.data.as_str(),
            self.recipient_address.as_str(),
        ]
    }
}

/// Web service definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebServiceDefinition {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// Asset management attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAttribute {
    /// Attribute name (identifier).
    pub name: String,
    #[serde(default)]
    pub display_name: String,
}

/// Agent policy attached to a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPolicy {
    pub guid: Uuid,
    #[serde(default)]
    pub name: String,
    /// Policy type, e.g. `AgentConfig` or `LogParserConfig`.
    pub policy_type: String,
    #[serde(default)]
    pub flags: u32,
    #[serde(default)]
    pub content: String,
}

impl AgentPolicy {
    /// Agent configuration policy with macro expansion enabled.
    pub fn expands_macros(&self) -> bool {
        self.policy_type == AGENT_CONFIG_POLICY_TYPE && self.flags & POLICY_FLAG_EXPAND_MACRO != 0
    }
}

/// Configuration repository an export can be published to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i32,
    pub url: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_expands_nested_templates() {
        let group = TemplateGroup {
            id: 1,
            name: "Root".to_string(),
            templates: vec![Template::new(10, "Linux")],
            groups: vec![TemplateGroup {
                id: 2,
                name: "Network".to_string(),
                templates: vec![Template::new(20, "Cisco"), Template::new(21, "Juniper")],
                groups: Vec::new(),
            }],
        };
        let ids: Vec<u32> = group.all_templates().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![10, 20, 21]);
    }

    #[test]
    fn test_rule_text_fields_cover_storage_and_timers() {
        let mut rule = EventProcessingRule::new(Uuid::nil());
        rule.alarm_key = "key".to_string();
        rule.persistent_storage_set
            .insert("pk".to_string(), "pv".to_string());
        rule.custom_attribute_delete.push("cad".to_string());
        rule.actions.push(ActionExecution {
            action_id: 1,
            timer_key: "tk".to_string(),
            blocking_timer_key: "btk".to_string(),
            ..ActionExecution::default()
        });
        rule.timer_cancellations.push("tc".to_string());

        let fields = rule.text_fields();
        for expected in ["key", "pk", "pv", "cad", "tk", "btk", "tc"] {
            assert!(fields.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_policy_macro_expansion_flag() {
        let mut policy = AgentPolicy {
            guid: Uuid::nil(),
            name: "cfg".to_string(),
            policy_type: AGENT_CONFIG_POLICY_TYPE.to_string(),
            flags: POLICY_FLAG_EXPAND_MACRO,
            content: String::new(),
        };
        assert!(policy.expands_macros());

        policy.flags = 0;
        assert!(!policy.expands_macros());

        policy.flags = POLICY_FLAG_EXPAND_MACRO;
        policy.policy_type = "LogParserConfig".to_string();
        assert!(!policy.expands_macros());
    }
}
