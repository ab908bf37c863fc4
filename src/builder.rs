// Config Export Builder - Export Builder
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Interactive export builder.
//!
//! [`ExportBuilder`] is what an export view talks to. Adding roots merges
//! them into the registry right away and then schedules at most one
//! background expansion round; the call itself never waits for the
//! round. Rounds are serialized through a single gate, and every round
//! outcome is broadcast as a [`BuilderEvent`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::assembler::assemble;
use crate::expander::{Expander, FetchRequest};
use crate::models::{
    AppConfig, Entity, EntityKey, EntityKind, Error, Result, RootSelection, TemplateSelection,
};
use crate::orchestrator::{FetchOrchestrator, LivenessToken, RoundReport};
use crate::publish::{PublishOptions, Publisher};
use crate::registry::SharedRegistry;
use crate::session::ManagementSession;
use crate::storage;

/// Capacity of the notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Notification for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderEvent {
    /// Root objects were merged into the closure.
    RootsAdded { kind: EntityKind, count: usize },
    /// A background round finished.
    RoundCompleted { report: RoundReport },
    /// A selection could not be resolved; nothing was added.
    SelectionFailed { kind: EntityKind, message: String },
    /// A background round failed; the closure may be incomplete.
    RoundFailed { message: String },
    /// A bundle was generated.
    Exported { bytes: usize },
    /// Bundle generation failed.
    ExportFailed { message: String },
    /// A bundle was pushed to a repository.
    Published { repository_id: i32 },
}

/// Handle to the round scheduled by [`ExportBuilder::add_root`].
#[derive(Debug)]
pub struct RoundHandle {
    inner: RoundState,
}

#[derive(Debug)]
enum RoundState {
    Ready(RoundReport),
    Spawned(JoinHandle<Result<RoundReport>>),
}

impl RoundHandle {
    fn ready() -> Self {
        Self {
            inner: RoundState::Ready(RoundReport::default()),
        }
    }

    /// Whether a background round was started.
    pub fn is_background(&self) -> bool {
        matches!(self.inner, RoundState::Spawned(_))
    }

    pub fn is_finished(&self) -> bool {
        match &self.inner {
            RoundState::Ready(_) => true,
            RoundState::Spawned(handle) => handle.is_finished(),
        }
    }

    /// Wait for the round to finish.
    pub async fn wait(self) -> Result<RoundReport> {
        match self.inner {
            RoundState::Ready(report) => Ok(report),
            RoundState::Spawned(handle) => handle
                .await
                .map_err(|e| Error::Internal(format!("expansion round panicked: {}", e)))?,
        }
    }
}

/// Dependency-closure builder behind an export view.
pub struct ExportBuilder {
    config: AppConfig,
    registry: Arc<SharedRegistry>,
    orchestrator: Arc<FetchOrchestrator>,
    liveness: LivenessToken,
    round_gate: Arc<Mutex<()>>,
    events: broadcast::Sender<BuilderEvent>,
    /// Registry revision contained in the last successful export.
    exported_revision: AtomicU64,
}

impl ExportBuilder {
    /// Create an empty builder over `session`.
    pub fn new(session: Arc<dyn ManagementSession>, config: AppConfig) -> Self {
        let expander = Expander::new(config.system_event_threshold);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            registry: Arc::new(SharedRegistry::new()),
            orchestrator: Arc::new(FetchOrchestrator::new(session, expander)),
            liveness: LivenessToken::new(),
            round_gate: Arc::new(Mutex::new(())),
            events,
            exported_revision: AtomicU64::new(0),
        }
    }

    /// Receive operator notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<BuilderEvent> {
        self.events.subscribe()
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Whether the closure changed since the last export.
    ///
    /// Objects merged by a round that was still running during the export
    /// count as a change.
    pub fn is_modified(&self) -> bool {
        self.registry.revision() != self.exported_revision.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.liveness.is_alive()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::ViewClosed)
        }
    }

    fn notify(&self, event: BuilderEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Add root objects and schedule their dependency round.
    ///
    /// The direct objects are in the registry when this returns. Selections
    /// made by identifier must exist in the server's list; otherwise nothing
    /// is added.
    pub async fn add_root(&self, selection: RootSelection) -> Result<RoundHandle> {
        self.ensure_open()?;
        let kind = selection.kind();
        let direct = match self.resolve(selection).await {
            Ok(direct) => direct,
            Err(e) => {
                error!("Cannot add {} selection: {}", kind, e);
                self.notify(BuilderEvent::SelectionFailed {
                    kind,
                    message: e.to_string(),
                });
                return Err(e);
            }
        };
        if direct.is_empty() {
            return Ok(RoundHandle::ready());
        }

        self.ensure_open()?;
        let count = direct.len();
        self.registry.merge(direct.clone());
        info!("Added {} {} root object(s)", count, kind);
        self.notify(BuilderEvent::RootsAdded { kind, count });

        if !self.config.resolve_dependencies {
            return Ok(RoundHandle::ready());
        }
        let seed = self.orchestrator.expander().expand_all(&direct);
        if seed.is_empty() {
            return Ok(RoundHandle::ready());
        }

        Ok(RoundHandle {
            inner: RoundState::Spawned(self.spawn_round(seed)),
        })
    }

    fn spawn_round(&self, seed: Vec<FetchRequest>) -> JoinHandle<Result<RoundReport>> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let registry = Arc::clone(&self.registry);
        let liveness = self.liveness.clone();
        let gate = Arc::clone(&self.round_gate);
        let events = self.events.clone();

        tokio::spawn(async move {
            let _gate = gate.lock().await;
            if !liveness.is_alive() {
                debug!("Export view closed before round started");
                return Ok(RoundReport {
                    cancelled: true,
                    ..RoundReport::default()
                });
            }

            let result = orchestrator.run_round(seed, &registry, &liveness).await;
            match &result {
                Ok(report) if report.cancelled => {}
                Ok(report) => {
                    let _ = events.send(BuilderEvent::RoundCompleted {
                        report: report.clone(),
                    });
                }
                Err(e) if liveness.is_alive() => {
                    error!("Cannot resolve export dependencies: {}", e);
                    let _ = events.send(BuilderEvent::RoundFailed {
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    debug!("Round failed after view was closed: {}", e);
                }
            }
            result
        })
    }

    /// Turn a selection into the entities it stands for.
    async fn resolve(&self, selection: RootSelection) -> Result<Vec<Entity>> {
        let entities = match selection {
            RootSelection::Templates(items) => items
                .into_iter()
                .flat_map(|item| match item {
                    TemplateSelection::Template(t) => vec![t],
                    TemplateSelection::Group(g) => g.all_templates(),
                })
                .map(Entity::Template)
                .collect(),
            RootSelection::Events(events) => events.into_iter().map(Entity::Event).collect(),
            RootSelection::SnmpTraps(ids) => {
                let traps = self.orchestrator.trap_summaries().await?;
                ids.iter()
                    .map(|id| {
                        traps
                            .iter()
                            .find(|t| t.id == *id)
                            .cloned()
                            .map(Entity::SnmpTrap)
                            .ok_or_else(|| Error::unknown_object("SNMP trap", id))
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            RootSelection::Rules(guids) => {
                let rules = self.orchestrator.rules().await?;
                guids
                    .iter()
                    .map(|guid| {
                        rules
                            .iter()
                            .find(|r| r.guid == *guid)
                            .cloned()
                            .map(Entity::Rule)
                            .ok_or_else(|| Error::unknown_object("rule", guid))
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            RootSelection::Actions(ids) => {
                let actions = self.orchestrator.actions().await?;
                ids.iter()
                    .map(|id| {
                        actions
                            .iter()
                            .find(|a| a.id == *id)
                            .cloned()
                            .map(Entity::Action)
                            .ok_or_else(|| Error::unknown_object("action", id))
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            RootSelection::Scripts(scripts) => scripts.into_iter().map(Entity::Script).collect(),
            RootSelection::ObjectTools(tools) => {
                tools.into_iter().map(Entity::ObjectTool).collect()
            }
            RootSelection::SummaryTables(tables) => {
                tables.into_iter().map(Entity::SummaryTable).collect()
            }
            RootSelection::WebServices(services) => {
                services.into_iter().map(Entity::WebService).collect()
            }
            RootSelection::AssetAttributes(attributes) => {
                attributes.into_iter().map(Entity::AssetAttribute).collect()
            }
        };
        Ok(entities)
    }

    /// Remove objects of one kind. Dependencies they pulled in stay.
    pub fn remove_root(&self, kind: EntityKind, keys: &[EntityKey]) -> Result<usize> {
        self.ensure_open()?;
        let removed = self.registry.remove(kind, keys);
        if removed > 0 {
            info!("Removed {} {} object(s)", removed, kind);
        }
        Ok(removed)
    }

    /// Drop everything selected so far.
    pub fn clear(&self) -> Result<()> {
        self.ensure_open()?;
        self.registry.clear();
        info!("Export selection cleared");
        Ok(())
    }

    /// Number of objects per kind.
    pub fn current_counts(&self) -> BTreeMap<EntityKind, usize> {
        self.registry.counts()
    }

    /// Generate the export bundle for the current closure.
    pub async fn export(&self, description: &str) -> Result<String> {
        self.ensure_open()?;
        let (request, revision) = self
            .registry
            .read_at_revision(|registry| assemble(registry, description));
        info!("Exporting configuration with {} object(s)", request.len());

        match self
            .orchestrator
            .session()
            .export_configuration(&request)
            .await
        {
            Ok(bundle) => {
                self.exported_revision.store(revision, Ordering::SeqCst);
                self.notify(BuilderEvent::Exported {
                    bytes: bundle.len(),
                });
                Ok(bundle)
            }
            Err(e) => {
                error!("Cannot export configuration: {}", e);
                self.notify(BuilderEvent::ExportFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Export and write the bundle to `path`.
    pub async fn save(&self, description: &str, path: &Path) -> Result<PathBuf> {
        let bundle = self.export(description).await?;
        storage::write_bundle(path, &bundle)?;
        Ok(path.to_path_buf())
    }

    /// Export and push the bundle to a configured repository.
    pub async fn publish(&self, description: &str, repository_id: i32) -> Result<()> {
        self.ensure_open()?;
        let repositories = self.orchestrator.session().list_repositories().await?;
        let repository = repositories
            .into_iter()
            .find(|r| r.id == repository_id)
            .ok_or(Error::RepositoryNotFound(repository_id))?;

        let bundle = self.export(description).await?;
        let publisher = Publisher::new(PublishOptions::from_config(&self.config))?;
        if let Err(e) = publisher.push_export(&repository, &bundle).await {
            warn!("Publishing to {} failed: {}", repository.url, e);
            return Err(e);
        }
        self.notify(BuilderEvent::Published { repository_id });
        Ok(())
    }

    /// Close the view. Rounds still running finish without merging.
    pub fn close(&self) {
        if self.is_open() {
            debug!("Export view closed");
        }
        self.liveness.revoke();
    }
}

impl Drop for ExportBuilder {
    fn drop(&mut self) {
        self.liveness.revoke();
    }
}
