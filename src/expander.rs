// Config Export Builder - Dependency Expander
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Per-kind dependency rules.
//!
//! The expander never talks to the server. For every entity it returns
//! the [`FetchRequest`]s needed to pull in what that entity references;
//! the orchestrator performs them and feeds the fetched objects back in.
//!
//! ## Rules
//!
//! | Kind | Produces |
//! |---|---|
//! | Template | related events, data collection scripts, agent policies |
//! | Event | scripts referenced from the message |
//! | SNMP trap | its user-defined event |
//! | Rule | user-defined events, actions, scripts from every text field |
//! | Action | scripts from subject, payload and recipient |
//! | Others | nothing |

use std::collections::BTreeSet;

use crate::models::{AgentPolicy, Entity, EntityKind};
use crate::scanner;

/// Data needed from the server to complete an entity's dependencies.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FetchRequest {
    /// Event codes causally related to a template.
    RelatedEvents { template_id: u32 },
    /// Scripts used by a template's data collection items.
    DataCollectionScripts { template_id: u32 },
    /// Agent policies attached to a template.
    AgentPolicies { template_id: u32 },
    /// Event definitions by code.
    EventDefinitions { codes: BTreeSet<u32> },
    /// Server actions by identifier.
    Actions { ids: BTreeSet<u32> },
    /// Library scripts by name.
    Scripts { names: BTreeSet<String> },
}

impl FetchRequest {
    /// Short name used in logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::RelatedEvents { .. } => "relatedEventCodes",
            Self::DataCollectionScripts { .. } => "dataCollectionScripts",
            Self::AgentPolicies { .. } => "agentPolicies",
            Self::EventDefinitions { .. } => "findEventDefinitions",
            Self::Actions { .. } => "listActions",
            Self::Scripts { .. } => "listLibraryScripts",
        }
    }
}

type ExpandFn = fn(&Expander, &Entity) -> Vec<FetchRequest>;

/// Expansion rule for one entity kind.
pub struct ExpansionRule {
    pub kind: EntityKind,
    expand: ExpandFn,
}

static RULES: [ExpansionRule; 10] = [
    ExpansionRule { kind: EntityKind::Template, expand: expand_template },
    ExpansionRule { kind: EntityKind::Event, expand: expand_event },
    ExpansionRule { kind: EntityKind::SnmpTrap, expand: expand_trap },
    ExpansionRule { kind: EntityKind::Rule, expand: expand_rule },
    ExpansionRule { kind: EntityKind::Script, expand: expand_leaf },
    ExpansionRule { kind: EntityKind::ObjectTool, expand: expand_leaf },
    ExpansionRule { kind: EntityKind::SummaryTable, expand: expand_leaf },
    ExpansionRule { kind: EntityKind::Action, expand: expand_action },
    ExpansionRule { kind: EntityKind::WebService, expand: expand_leaf },
    ExpansionRule { kind: EntityKind::AssetAttribute, expand: expand_leaf },
];

/// Look up the rule for a kind.
pub fn rule_for(kind: EntityKind) -> &'static ExpansionRule {
    RULES
        .iter()
        .find(|rule| rule.kind == kind)
        .unwrap_or(&RULES[4])
}

fn expand_template(_: &Expander, entity: &Entity) -> Vec<FetchRequest> {
    let Entity::Template(template) = entity else {
        return Vec::new();
    };
    vec![
        FetchRequest::RelatedEvents { template_id: template.id },
        FetchRequest::DataCollectionScripts { template_id: template.id },
        FetchRequest::AgentPolicies { template_id: template.id },
    ]
}

fn expand_event(_: &Expander, entity: &Entity) -> Vec<FetchRequest> {
    let Entity::Event(event) = entity else {
        return Vec::new();
    };
    scripts_request(scanner::scan_fields([event.message.as_str()]))
        .into_iter()
        .collect()
}

fn expand_trap(expander: &Expander, entity: &Entity) -> Vec<FetchRequest> {
    let Entity::SnmpTrap(trap) = entity else {
        return Vec::new();
    };
    events_request(expander.user_event_codes([trap.event_code]))
        .into_iter()
        .collect()
}

fn expand_rule(expander: &Expander, entity: &Entity) -> Vec<FetchRequest> {
    let Entity::Rule(rule) = entity else {
        return Vec::new();
    };
    let mut requests = Vec::new();
    requests.extend(events_request(
        expander.user_event_codes(rule.events.iter().copied()),
    ));
    let action_ids: BTreeSet<u32> = rule.actions.iter().map(|a| a.action_id).collect();
    if !action_ids.is_empty() {
        requests.push(FetchRequest::Actions { ids: action_ids });
    }
    requests.extend(scripts_request(scanner::scan_fields(rule.text_fields())));
    requests
}

fn expand_action(_: &Expander, entity: &Entity) -> Vec<FetchRequest> {
    let Entity::Action(action) = entity else {
        return Vec::new();
    };
    scripts_request(scanner::scan_fields(action.text_fields()))
        .into_iter()
        .collect()
}

fn expand_leaf(_: &Expander, _: &Entity) -> Vec<FetchRequest> {
    Vec::new()
}

fn events_request(codes: BTreeSet<u32>) -> Option<FetchRequest> {
    (!codes.is_empty()).then_some(FetchRequest::EventDefinitions { codes })
}

fn scripts_request(names: BTreeSet<String>) -> Option<FetchRequest> {
    (!names.is_empty()).then_some(FetchRequest::Scripts { names })
}

/// Applies the per-kind rules with a fixed system-event threshold.
#[derive(Debug, Clone, Copy)]
pub struct Expander {
    system_event_threshold: u32,
}

impl Expander {
    pub fn new(system_event_threshold: u32) -> Self {
        Self {
            system_event_threshold,
        }
    }

    /// Whether `code` denotes a user-defined event.
    pub fn is_user_event(&self, code: u32) -> bool {
        code >= self.system_event_threshold
    }

    /// Keep only user-defined event codes.
    pub fn user_event_codes<I>(&self, codes: I) -> BTreeSet<u32>
    where
        I: IntoIterator<Item = u32>,
    {
        codes
            .into_iter()
            .filter(|code| self.is_user_event(*code))
            .collect()
    }

    /// Requests needed to complete `entity`.
    pub fn expand(&self, entity: &Entity) -> Vec<FetchRequest> {
        (rule_for(entity.kind()).expand)(self, entity)
    }

    /// Requests needed to complete every entity, coalesced.
    pub fn expand_all<'a, I>(&self, entities: I) -> Vec<FetchRequest>
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        coalesce(entities.into_iter().flat_map(|e| self.expand(e)))
    }

    /// Event request for the related codes of a template.
    pub fn expand_related_events(&self, codes: &[u32]) -> Option<FetchRequest> {
        events_request(self.user_event_codes(codes.iter().copied()))
    }

    /// Script request for agent policies that expand macros.
    pub fn expand_policies(&self, policies: &[AgentPolicy]) -> Option<FetchRequest> {
        scripts_request(scanner::scan_fields(
            policies
                .iter()
                .filter(|p| p.expands_macros())
                .map(|p| p.content.as_str()),
        ))
    }
}

/// Merge set-valued requests of the same type and drop duplicates.
pub fn coalesce<I>(requests: I) -> Vec<FetchRequest>
where
    I: IntoIterator<Item = FetchRequest>,
{
    let mut per_template = BTreeSet::new();
    let mut codes = BTreeSet::new();
    let mut ids = BTreeSet::new();
    let mut names = BTreeSet::new();

    for request in requests {
        match request {
            FetchRequest::EventDefinitions { codes: c } => codes.extend(c),
            FetchRequest::Actions { ids: i } => ids.extend(i),
            FetchRequest::Scripts { names: n } => names.extend(n),
            other => {
                per_template.insert(other);
            }
        }
    }

    let mut result: Vec<FetchRequest> = per_template.into_iter().collect();
    result.extend(events_request(codes));
    if !ids.is_empty() {
        result.push(FetchRequest::Actions { ids });
    }
    result.extend(scripts_request(names));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::objects::{AGENT_CONFIG_POLICY_TYPE, POLICY_FLAG_EXPAND_MACRO};
    use crate::models::{
        ActionExecution, EventProcessingRule, EventTemplate, ObjectTool, ServerAction, SnmpTrap,
        Template,
    };
    use uuid::Uuid;

    fn expander() -> Expander {
        Expander::new(100_000)
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_threshold_filtering() {
        let codes = expander().user_event_codes([17, 100_042, 99_999, 200_000]);
        assert_eq!(codes.into_iter().collect::<Vec<_>>(), vec![100_042, 200_000]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert!(expander().is_user_event(100_000));
        assert!(!expander().is_user_event(99_999));
    }

    #[test]
    fn test_template_requests() {
        let requests = expander().expand(&Entity::Template(Template::new(42, "Linux")));
        assert_eq!(
            requests,
            vec![
                FetchRequest::RelatedEvents { template_id: 42 },
                FetchRequest::DataCollectionScripts { template_id: 42 },
                FetchRequest::AgentPolicies { template_id: 42 },
            ]
        );
    }

    #[test]
    fn test_event_message_scanned() {
        let event = EventTemplate::new(100_010, "DISK_LOW", "Disk low, %[NotifyAdmins] called");
        assert_eq!(
            expander().expand(&Entity::Event(event)),
            vec![FetchRequest::Scripts { names: names(&["NotifyAdmins"]) }]
        );
    }

    #[test]
    fn test_system_trap_event_not_requested() {
        let trap = SnmpTrap {
            id: 1,
            event_code: 500,
            ..SnmpTrap::default()
        };
        assert!(expander().expand(&Entity::SnmpTrap(trap)).is_empty());

        let trap = SnmpTrap {
            id: 2,
            event_code: 100_500,
            ..SnmpTrap::default()
        };
        assert_eq!(
            expander().expand(&Entity::SnmpTrap(trap)),
            vec![FetchRequest::EventDefinitions { codes: [100_500].into() }]
        );
    }

    #[test]
    fn test_rule_collects_events_actions_and_scripts() {
        let mut rule = EventProcessingRule::new(Uuid::new_v4());
        rule.events = vec![12, 100_001];
        rule.actions = vec![
            ActionExecution {
                action_id: 7,
                timer_key: "%[TimerKey]".to_string(),
                ..ActionExecution::default()
            },
            ActionExecution {
                action_id: 9,
                ..ActionExecution::default()
            },
        ];
        rule.alarm_message = "%[AlarmText.short]".to_string();
        rule.persistent_storage_set
            .insert("k".to_string(), "%[StorageValue]".to_string());
        rule.custom_attribute_set
            .insert("%[AttrName]".to_string(), "v".to_string());
        rule.timer_cancellations.push("%%[NotAScript]".to_string());

        let requests = expander().expand(&Entity::Rule(rule));
        assert_eq!(
            requests,
            vec![
                FetchRequest::EventDefinitions { codes: [100_001].into() },
                FetchRequest::Actions { ids: [7, 9].into() },
                FetchRequest::Scripts {
                    names: names(&["AlarmText", "AttrName", "StorageValue", "TimerKey"])
                },
            ]
        );
    }

    #[test]
    fn test_action_fields_scanned() {
        let action = ServerAction {
            id: 3,
            email_subject: "%[Subject]".to_string(),
            data: "body %[Body/1]".to_string(),
            recipient_address: "%[Recipient]".to_string(),
            ..ServerAction::default()
        };
        assert_eq!(
            expander().expand(&Entity::Action(action)),
            vec![FetchRequest::Scripts { names: names(&["Body", "Recipient", "Subject"]) }]
        );
    }

    #[test]
    fn test_leaf_kinds_produce_nothing() {
        let tool = Entity::ObjectTool(ObjectTool {
            id: 1,
            name: "%[LooksLikeAScript]".to_string(),
        });
        assert!(expander().expand(&tool).is_empty());
    }

    #[test]
    fn test_policies_need_macro_flag() {
        let policy = |flags: u32, content: &str| AgentPolicy {
            guid: Uuid::new_v4(),
            name: String::new(),
            policy_type: AGENT_CONFIG_POLICY_TYPE.to_string(),
            flags,
            content: content.to_string(),
        };
        let policies = vec![
            policy(POLICY_FLAG_EXPAND_MACRO, "Param=%[Expanded]"),
            policy(0, "Param=%[Ignored]"),
        ];
        assert_eq!(
            expander().expand_policies(&policies),
            Some(FetchRequest::Scripts { names: names(&["Expanded"]) })
        );
        assert_eq!(expander().expand_policies(&policies[1..]), None);
    }

    #[test]
    fn test_coalesce_merges_sets() {
        let merged = coalesce(vec![
            FetchRequest::Scripts { names: names(&["A"]) },
            FetchRequest::EventDefinitions { codes: [100_001].into() },
            FetchRequest::RelatedEvents { template_id: 1 },
            FetchRequest::Scripts { names: names(&["B", "A"]) },
            FetchRequest::RelatedEvents { template_id: 1 },
            FetchRequest::EventDefinitions { codes: [100_002].into() },
        ]);
        assert_eq!(
            merged,
            vec![
                FetchRequest::RelatedEvents { template_id: 1 },
                FetchRequest::EventDefinitions { codes: [100_001, 100_002].into() },
                FetchRequest::Scripts { names: names(&["A", "B"]) },
            ]
        );
    }
}
