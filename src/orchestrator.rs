// Config Export Builder - Fetch Orchestrator
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Executes expansion rounds against the management session.
//!
//! A round starts from the requests the expander produced for newly added
//! roots. Each request is answered with one query, the fetched objects are
//! merged into the registry as a single batch, and the expander is run on
//! them to find further requests. The round ends when nothing new is left.
//!
//! Queries inside a round are chained, never issued concurrently. If one
//! fails the round stops; batches merged before the failure stay.
//!
//! The trap summary, the rule set and the action list are fetched at most
//! once per orchestrator and shared afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::expander::{coalesce, Expander, FetchRequest};
use crate::models::{Entity, EntityKind, EventProcessingRule, Result, Script, ServerAction, SnmpTrap};
use crate::registry::SharedRegistry;
use crate::session::ManagementSession;

/// Liveness of the view that owns a round.
///
/// Cloned into every round; once revoked, the round stops merging and
/// finishes quietly.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    alive: Arc<AtomicBool>,
}

impl LivenessToken {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn revoke(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl Default for LivenessToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one expansion round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Queries answered during the round.
    pub requests: usize,
    /// Newly added entities per kind.
    pub added: BTreeMap<EntityKind, usize>,
    /// Script names that matched nothing in the library.
    pub unresolved_scripts: BTreeSet<String>,
    /// The owning view was closed before the round finished.
    pub cancelled: bool,
}

impl RoundReport {
    pub fn total_added(&self) -> usize {
        self.added.values().sum()
    }

    fn record(&mut self, entities: &[Entity], added: usize) {
        if let Some(first) = entities.first() {
            *self.added.entry(first.kind()).or_insert(0) += added;
        }
    }
}

/// Result of answering one request.
#[derive(Default)]
struct Answer {
    entities: Vec<Entity>,
    follow_up: Vec<FetchRequest>,
}

/// Items already requested in the current round.
#[derive(Default)]
struct RoundState {
    per_template: BTreeSet<FetchRequest>,
    event_codes: HashSet<u32>,
    action_ids: HashSet<u32>,
    script_names: HashSet<String>,
}

impl RoundState {
    /// Strip everything already requested. `None` if nothing is left.
    fn take_new(&mut self, request: FetchRequest) -> Option<FetchRequest> {
        match request {
            FetchRequest::EventDefinitions { codes } => {
                let codes: BTreeSet<u32> = codes
                    .into_iter()
                    .filter(|c| self.event_codes.insert(*c))
                    .collect();
                (!codes.is_empty()).then_some(FetchRequest::EventDefinitions { codes })
            }
            FetchRequest::Actions { ids } => {
                let ids: BTreeSet<u32> =
                    ids.into_iter().filter(|i| self.action_ids.insert(*i)).collect();
                (!ids.is_empty()).then_some(FetchRequest::Actions { ids })
            }
            FetchRequest::Scripts { names } => {
                let names: BTreeSet<String> = names
                    .into_iter()
                    .filter(|n| self.script_names.insert(n.to_lowercase()))
                    .collect();
                (!names.is_empty()).then_some(FetchRequest::Scripts { names })
            }
            other => self.per_template.insert(other.clone()).then_some(other),
        }
    }
}

/// Performs the network side of dependency expansion.
pub struct FetchOrchestrator {
    session: Arc<dyn ManagementSession>,
    expander: Expander,
    traps: OnceCell<Arc<Vec<SnmpTrap>>>,
    rules: OnceCell<Arc<Vec<EventProcessingRule>>>,
    actions: OnceCell<Arc<Vec<ServerAction>>>,
}

impl FetchOrchestrator {
    pub fn new(session: Arc<dyn ManagementSession>, expander: Expander) -> Self {
        Self {
            session,
            expander,
            traps: OnceCell::new(),
            rules: OnceCell::new(),
            actions: OnceCell::new(),
        }
    }

    pub fn session(&self) -> &Arc<dyn ManagementSession> {
        &self.session
    }

    pub fn expander(&self) -> &Expander {
        &self.expander
    }

    /// SNMP trap summary, fetched on first use.
    pub async fn trap_summaries(&self) -> Result<Arc<Vec<SnmpTrap>>> {
        if self.traps.initialized() {
            debug!("Using cached SNMP trap summary");
        }
        let traps = self
            .traps
            .get_or_try_init(|| async {
                info!("Loading SNMP trap configuration");
                Ok::<_, crate::models::Error>(Arc::new(self.session.list_trap_summaries().await?))
            })
            .await?;
        Ok(Arc::clone(traps))
    }

    /// Event processing rules, fetched on first use.
    pub async fn rules(&self) -> Result<Arc<Vec<EventProcessingRule>>> {
        if self.rules.initialized() {
            debug!("Using cached event processing policy");
        }
        let rules = self
            .rules
            .get_or_try_init(|| async {
                info!("Loading event processing policy");
                Ok::<_, crate::models::Error>(Arc::new(
                    self.session.event_processing_rules().await?,
                ))
            })
            .await?;
        Ok(Arc::clone(rules))
    }

    /// Server actions, fetched on first use.
    pub async fn actions(&self) -> Result<Arc<Vec<ServerAction>>> {
        if self.actions.initialized() {
            debug!("Using cached action list");
        }
        let actions = self
            .actions
            .get_or_try_init(|| async {
                info!("Loading server actions");
                Ok::<_, crate::models::Error>(Arc::new(self.session.list_actions().await?))
            })
            .await?;
        Ok(Arc::clone(actions))
    }

    /// Run one expansion round seeded with `seed`.
    pub async fn run_round(
        &self,
        seed: Vec<FetchRequest>,
        registry: &SharedRegistry,
        liveness: &LivenessToken,
    ) -> Result<RoundReport> {
        let mut report = RoundReport::default();
        let mut state = RoundState::default();
        let mut library: Option<HashMap<String, Script>> = None;
        let mut pending = coalesce(seed);

        while !pending.is_empty() {
            let request = pending.remove(0);
            let Some(request) = state.take_new(request) else {
                continue;
            };

            debug!("Expansion request: {}", request.operation());
            let answer = self.answer(request, &mut library, &mut report).await?;
            report.requests += 1;

            if !liveness.is_alive() {
                debug!("Export view closed, discarding round results");
                report.cancelled = true;
                return Ok(report);
            }

            let added = registry.merge(answer.entities.clone());
            report.record(&answer.entities, added);

            let follow_up = self.expander.expand_all(&answer.entities);
            pending = coalesce(pending.into_iter().chain(answer.follow_up).chain(follow_up));
        }

        info!(
            "Expansion round finished: {} queries, {} new objects",
            report.requests,
            report.total_added()
        );
        Ok(report)
    }

    async fn answer(
        &self,
        request: FetchRequest,
        library: &mut Option<HashMap<String, Script>>,
        report: &mut RoundReport,
    ) -> Result<Answer> {
        match request {
            FetchRequest::RelatedEvents { template_id } => {
                let codes = self.session.related_event_codes(template_id).await?;
                Ok(Answer {
                    entities: Vec::new(),
                    follow_up: self.expander.expand_related_events(&codes).into_iter().collect(),
                })
            }
            FetchRequest::DataCollectionScripts { template_id } => {
                let scripts = self.session.data_collection_scripts(template_id).await?;
                Ok(Answer {
                    entities: scripts.into_iter().map(Entity::Script).collect(),
                    follow_up: Vec::new(),
                })
            }
            FetchRequest::AgentPolicies { template_id } => {
                let policies = self.session.agent_policies(template_id).await?;
                Ok(Answer {
                    entities: Vec::new(),
                    follow_up: self.expander.expand_policies(&policies).into_iter().collect(),
                })
            }
            FetchRequest::EventDefinitions { codes } => {
                let events = self.session.find_event_definitions(&codes).await?;
                Ok(Answer {
                    entities: events.into_iter().map(Entity::Event).collect(),
                    follow_up: Vec::new(),
                })
            }
            FetchRequest::Actions { ids } => {
                let actions = self.actions().await?;
                Ok(Answer {
                    entities: actions
                        .iter()
                        .filter(|a| ids.contains(&a.id))
                        .cloned()
                        .map(Entity::Action)
                        .collect(),
                    follow_up: Vec::new(),
                })
            }
            FetchRequest::Scripts { names } => {
                if library.is_none() {
                    let scripts = self.session.list_library_scripts().await?;
                    *library = Some(
                        scripts
                            .into_iter()
                            .map(|s| (s.name.to_lowercase(), s))
                            .collect(),
                    );
                }
                let mut entities = Vec::new();
                if let Some(library) = library.as_ref() {
                    for name in names {
                        match library.get(&name.to_lowercase()) {
                            Some(script) => entities.push(Entity::Script(script.clone())),
                            None => {
                                debug!("Script reference '{}' does not match any library script", name);
                                report.unresolved_scripts.insert(name);
                            }
                        }
                    }
                }
                Ok(Answer {
                    entities,
                    follow_up: Vec::new(),
                })
            }
        }
    }
}
