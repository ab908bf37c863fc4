// Config Export Builder - Entity Registry
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Per-kind deduplicated collections of the objects selected for export.
//!
//! Each kind maps its natural identifier to the entity. Adding an
//! identifier that is already present overwrites the stored entity, so
//! repeated additions never duplicate anything.
//!
//! [`SharedRegistry`] wraps the registry in an `RwLock` so background
//! expansion rounds and the interactive caller can share it. Every batch
//! of changes is applied under a single write lock, which makes it atomic
//! with respect to readers. Lock poisoning is recovered from, as a panic in
//! another thread does not invalidate the collections.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::warn;

use crate::models::{Entity, EntityKey, EntityKind};

/// Deduplicated per-kind entity collections.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    collections: BTreeMap<EntityKind, HashMap<EntityKey, Entity>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entity. Returns `true` if the key was new.
    pub fn add(&mut self, entity: Entity) -> bool {
        self.collections
            .entry(entity.kind())
            .or_default()
            .insert(entity.key(), entity)
            .is_none()
    }

    /// Insert every entity. Returns the number of new keys.
    pub fn add_all<I>(&mut self, entities: I) -> usize
    where
        I: IntoIterator<Item = Entity>,
    {
        let mut added = 0;
        for entity in entities {
            if self.add(entity) {
                added += 1;
            }
        }
        added
    }

    /// Delete the given keys of one kind. Missing keys are ignored.
    pub fn remove(&mut self, kind: EntityKind, keys: &[EntityKey]) -> usize {
        let Some(collection) = self.collections.get_mut(&kind) else {
            return 0;
        };
        keys.iter().filter(|k| collection.remove(*k).is_some()).count()
    }

    pub fn contains(&self, kind: EntityKind, key: &EntityKey) -> bool {
        self.collections
            .get(&kind)
            .is_some_and(|c| c.contains_key(key))
    }

    pub fn get(&self, kind: EntityKind, key: &EntityKey) -> Option<&Entity> {
        self.collections.get(&kind).and_then(|c| c.get(key))
    }

    /// Identifiers currently held for `kind`, sorted.
    pub fn snapshot(&self, kind: EntityKind) -> Vec<EntityKey> {
        let mut keys: Vec<EntityKey> = self
            .collections
            .get(&kind)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.collections.get(&kind).map_or(0, HashMap::len)
    }

    /// Size of every kind, including empty ones.
    pub fn counts(&self) -> BTreeMap<EntityKind, usize> {
        EntityKind::all()
            .iter()
            .map(|kind| (*kind, self.len(*kind)))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.collections.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn clear(&mut self) {
        self.collections.clear();
    }
}

/// Registry shared between the caller and background rounds.
///
/// The revision counts changes to the set of held identifiers. It is
/// bumped while the write lock is held, so a reader sees the revision
/// that matches the contents it reads.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    inner: RwLock<Registry>,
    revision: AtomicU64,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `reader` against a consistent view of the registry.
    pub fn read<F, R>(&self, reader: F) -> R
    where
        F: FnOnce(&Registry) -> R,
    {
        match self.inner.read() {
            Ok(guard) => reader(&*guard),
            Err(poisoned) => {
                warn!("Registry lock poisoned while reading, recovering");
                reader(&*poisoned.into_inner())
            }
        }
    }

    /// Apply `writer` as one atomic mutation.
    pub fn write<F, R>(&self, writer: F) -> R
    where
        F: FnOnce(&mut Registry) -> R,
    {
        match self.inner.write() {
            Ok(mut guard) => writer(&mut *guard),
            Err(poisoned) => {
                warn!("Registry lock poisoned while writing, recovering");
                writer(&mut *poisoned.into_inner())
            }
        }
    }

    /// Merge a batch of entities atomically. Returns the number of new keys.
    pub fn merge(&self, entities: Vec<Entity>) -> usize {
        if entities.is_empty() {
            return 0;
        }
        self.write(|registry| {
            let added = registry.add_all(entities);
            if added > 0 {
                self.bump();
            }
            added
        })
    }

    pub fn remove(&self, kind: EntityKind, keys: &[EntityKey]) -> usize {
        self.write(|registry| {
            let removed = registry.remove(kind, keys);
            if removed > 0 {
                self.bump();
            }
            removed
        })
    }

    pub fn clear(&self) {
        self.write(|registry| {
            if !registry.is_empty() {
                registry.clear();
                self.bump();
            }
        });
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Run `reader` and return its result with the matching revision.
    pub fn read_at_revision<F, R>(&self, reader: F) -> (R, u64)
    where
        F: FnOnce(&Registry) -> R,
    {
        self.read(|registry| (reader(registry), self.revision()))
    }

    pub fn snapshot(&self, kind: EntityKind) -> Vec<EntityKey> {
        self.read(|registry| registry.snapshot(kind))
    }

    pub fn counts(&self) -> BTreeMap<EntityKind, usize> {
        self.read(Registry::counts)
    }

    /// Copy of the whole registry.
    pub fn to_registry(&self) -> Registry {
        self.read(Registry::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetAttribute, Script, Template};

    fn template(id: u32, name: &str) -> Entity {
        Entity::Template(Template::new(id, name))
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut registry = Registry::new();
        assert!(registry.add(template(1, "Linux")));
        assert!(!registry.add(template(1, "Linux")));
        assert_eq!(registry.len(EntityKind::Template), 1);
        assert_eq!(registry.total(), 1);
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = Registry::new();
        registry.add(template(1, "Old name"));
        registry.add(template(1, "New name"));
        let stored = registry.get(EntityKind::Template, &EntityKey::Id(1)).unwrap();
        assert_eq!(stored.label(), "New name");
    }

    #[test]
    fn test_remove_ignores_missing_keys() {
        let mut registry = Registry::new();
        registry.add(template(1, "A"));
        registry.add(template(2, "B"));
        let removed = registry.remove(
            EntityKind::Template,
            &[EntityKey::Id(2), EntityKey::Id(99)],
        );
        assert_eq!(removed, 1);
        assert_eq!(registry.snapshot(EntityKind::Template), vec![EntityKey::Id(1)]);
        assert_eq!(registry.remove(EntityKind::Script, &[EntityKey::Id(1)]), 0);
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let mut registry = Registry::new();
        registry.add(template(7, "T"));
        registry.add(Entity::Script(Script::new(7, "S")));
        assert_eq!(registry.len(EntityKind::Template), 1);
        assert_eq!(registry.len(EntityKind::Script), 1);

        registry.remove(EntityKind::Script, &[EntityKey::Id(7)]);
        assert!(registry.contains(EntityKind::Template, &EntityKey::Id(7)));
    }

    #[test]
    fn test_snapshot_sorted() {
        let mut registry = Registry::new();
        for id in [5, 1, 3] {
            registry.add(template(id, ""));
        }
        assert_eq!(
            registry.snapshot(EntityKind::Template),
            vec![EntityKey::Id(1), EntityKey::Id(3), EntityKey::Id(5)]
        );
    }

    #[test]
    fn test_counts_include_empty_kinds() {
        let mut registry = Registry::new();
        registry.add(Entity::AssetAttribute(AssetAttribute {
            name: "serial".to_string(),
            display_name: String::new(),
        }));
        let counts = registry.counts();
        assert_eq!(counts.len(), EntityKind::all().len());
        assert_eq!(counts[&EntityKind::AssetAttribute], 1);
        assert_eq!(counts[&EntityKind::Event], 0);
    }

    #[test]
    fn test_shared_merge_and_clear() {
        let shared = SharedRegistry::new();
        assert_eq!(shared.merge(vec![template(1, "A"), template(1, "A"), template(2, "B")]), 2);
        assert_eq!(shared.counts()[&EntityKind::Template], 2);
        shared.clear();
        assert!(shared.to_registry().is_empty());
    }

    #[test]
    fn test_revision_tracks_membership_changes() {
        let shared = SharedRegistry::new();
        assert_eq!(shared.revision(), 0);

        shared.merge(vec![template(1, "A")]);
        assert_eq!(shared.revision(), 1);
        // Refreshing a held key is not a change.
        shared.merge(vec![template(1, "A2")]);
        assert_eq!(shared.revision(), 1);

        assert_eq!(shared.remove(EntityKind::Template, &[EntityKey::Id(9)]), 0);
        assert_eq!(shared.revision(), 1);

        let (total, revision) = shared.read_at_revision(Registry::total);
        assert_eq!((total, revision), (1, 1));

        shared.clear();
        assert_eq!(shared.revision(), 2);
        shared.clear();
        assert_eq!(shared.revision(), 2);
    }
}
