// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Query system with include/exclude filtering
//!
//! A [`Query`] caches the ids of every live entity that has all of its
//! included component keys and none of its excluded ones. The world marks
//! each query dirty with the entity that changed; the next read re-evaluates
//! only those entities, adding new matches and dropping stale ones.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::rc::Rc;
use tracing::trace;

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::component::ComponentManager;
use crate::entity::{EntityId, EntityManager};
use crate::event::{QueryEvent, QueryEventKind};
use crate::event_bus::{EventRegistry, Listener, ListenerId};
use crate::sparse_set::SparseSet;
use crate::world::World;

/// Memoization key of a query filter
pub type QueryHash = i32;

/// Matches above which the materialized entity list is kept between reads
pub const DEFAULT_ENTITY_CACHE_THRESHOLD: usize = 100;

/// Component filter: every `include` key (AND) and no `exclude` key (NOR)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `keys`
    pub fn with_include<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Forbid `keys`
    pub fn with_exclude<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Trim every key and drop empty ones. Declared order is kept.
    pub fn normalized(&self) -> Self {
        Self {
            include: normalize_keys(&self.include),
            exclude: normalize_keys(&self.exclude),
        }
    }

    /// Shorthand for [`Query::get_hash`]
    pub fn hash_key(&self) -> QueryHash {
        Query::get_hash(self)
    }
}

fn normalize_keys(keys: &[String]) -> Vec<String> {
    keys.iter()
        .map(|key| key.trim())
        .filter(|key| !key.is_empty())
        .map(str::to_owned)
        .collect()
}

fn join_keys(keys: &[String]) -> String {
    keys.iter()
        .map(|key| key.trim())
        .filter(|key| !key.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Cached, incrementally revalidated set of entities matching a filter
pub struct Query {
    config: QueryConfig,
    hash: QueryHash,
    matches: SparseSet<EntityId>,
    /// Entities touched since the last pass
    changed: SparseSet<EntityId>,
    dirty: bool,
    full_scan: bool,
    validated_version: Option<u64>,
    snapshot: Option<Rc<[EntityId]>>,
    cache_threshold: usize,
    events: EventRegistry<QueryEvent>,
}

impl Query {
    /// Create a query for `config`. The first validation scans every live
    /// entity.
    pub fn new(config: QueryConfig) -> Self {
        let config = config.normalized();
        let hash = Self::get_hash(&config);
        Self {
            config,
            hash,
            matches: SparseSet::new(),
            changed: SparseSet::new(),
            dirty: true,
            full_scan: true,
            validated_version: None,
            snapshot: None,
            cache_threshold: DEFAULT_ENTITY_CACHE_THRESHOLD,
            events: EventRegistry::new(),
        }
    }

    /// Set the match count above which [`Query::entities`] keeps its list
    pub fn with_cache_threshold(mut self, threshold: usize) -> Self {
        self.cache_threshold = threshold;
        self
    }

    /// 32-bit polynomial hash (`h * 31 + unit`, wrapping) of
    /// `"in_" + include + "_out_" + exclude`, keys trimmed and joined by `_`.
    ///
    /// Order-sensitive: the same keys listed in a different order hash
    /// differently. Each character contributes its first UTF-16 code unit.
    pub fn get_hash(config: &QueryConfig) -> QueryHash {
        let formed = format!(
            "in_{}_out_{}",
            join_keys(&config.include),
            join_keys(&config.exclude)
        );

        let mut buf = [0u16; 2];
        formed.chars().fold(0i32, |hash, ch| {
            let unit = ch.encode_utf16(&mut buf)[0];
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        })
    }

    pub fn hash(&self) -> QueryHash {
        self.hash
    }

    /// Normalized filter
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// True iff `id` has every included key and none of the excluded keys
    pub fn has_components(&self, components: &ComponentManager, id: EntityId) -> bool {
        self.config
            .include
            .iter()
            .all(|key| components.has_component(id, key))
            && !self
                .config
                .exclude
                .iter()
                .any(|key| components.has_component(id, key))
    }

    /// Record that `entity` changed and must be re-evaluated.
    ///
    /// `live` is the current number of live entities. Once more entities are
    /// pending than are alive, the next pass falls back to a full scan and
    /// the pending set is dropped.
    pub fn mark_dirty(&mut self, entity: EntityId, live: usize) {
        self.dirty = true;
        if self.full_scan {
            return;
        }
        self.changed.add(entity);
        if self.changed.len() > live {
            self.full_scan = true;
            self.changed.clear();
        }
    }

    /// Number of entities waiting for the next incremental pass
    pub fn pending_len(&self) -> usize {
        self.changed.len()
    }

    /// Force the next validation to scan every live entity
    pub fn mark_all_dirty(&mut self) {
        self.dirty = true;
        self.full_scan = true;
        self.validated_version = None;
        self.changed.clear();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// World version of the last successful validation
    pub fn validated_version(&self) -> Option<u64> {
        self.validated_version
    }

    /// Drop `id` from the cache immediately (entity destroyed)
    pub fn forget(&mut self, id: EntityId) -> bool {
        self.changed.remove(&id);
        self.set_membership(id, false)
    }

    /// Bring the cache up to date with `version`.
    ///
    /// Returns immediately if nothing was marked dirty or the cache already
    /// reflects `version`. Otherwise re-evaluates either every live entity
    /// (first pass, or after [`Query::mark_all_dirty`]) or only the entities
    /// marked since the last pass. Returns whether a pass ran.
    pub fn check_entities(
        &mut self,
        entities: &EntityManager,
        components: &ComponentManager,
        version: u64,
    ) -> bool {
        if !self.dirty || self.validated_version == Some(version) {
            return false;
        }

        #[cfg(feature = "profiling")]
        let span = info_span!(
            "query.check_entities",
            hash = self.hash,
            full_scan = self.full_scan
        );
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let before = self.matches.len();
        let mut evaluated = 0usize;

        if self.full_scan {
            for &id in entities.entities().values() {
                let matches = self.has_components(components, id);
                self.set_membership(id, matches);
                evaluated += 1;
            }

            let stale: SmallVec<[EntityId; 8]> = self
                .matches
                .iter()
                .copied()
                .filter(|id| !entities.exist(*id))
                .collect();
            for id in stale {
                self.set_membership(id, false);
            }
        } else {
            let mut candidates = std::mem::take(&mut self.changed);
            for &id in candidates.values() {
                let matches = entities.exist(id) && self.has_components(components, id);
                self.set_membership(id, matches);
                evaluated += 1;
            }
            // keep the allocation for the next batch
            candidates.clear();
            self.changed = candidates;
        }

        trace!(
            hash = self.hash,
            full_scan = self.full_scan,
            evaluated,
            before,
            after = self.matches.len(),
            "query revalidated"
        );

        self.dirty = false;
        self.full_scan = false;
        self.validated_version = Some(version);
        true
    }

    fn set_membership(&mut self, id: EntityId, matches: bool) -> bool {
        let event = if matches {
            self.matches.add(id).then_some(QueryEvent::Added(id))
        } else {
            self.matches.remove(&id).then_some(QueryEvent::Removed(id))
        };

        match event {
            Some(event) => {
                self.snapshot = None;
                self.events.emit(&event);
                true
            }
            None => false,
        }
    }

    /// Cached matching ids, as of the last validation
    pub fn ids(&self) -> &SparseSet<EntityId> {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.matches.has(&id)
    }

    /// Materialize the cached ids.
    ///
    /// Above the cache threshold the slice is shared between reads until the
    /// membership changes.
    pub fn entities(&mut self) -> Rc<[EntityId]> {
        if let Some(snapshot) = &self.snapshot {
            return Rc::clone(snapshot);
        }

        let list: Rc<[EntityId]> = self.matches.iter().copied().collect();
        if self.matches.len() > self.cache_threshold {
            self.snapshot = Some(Rc::clone(&list));
        }
        list
    }

    pub fn on(&mut self, kind: QueryEventKind, callback: Listener<QueryEvent>) -> ListenerId {
        self.events.on(kind, callback)
    }

    pub fn once(&mut self, kind: QueryEventKind, callback: Listener<QueryEvent>) -> ListenerId {
        self.events.once(kind, callback)
    }

    pub fn off(&mut self, kind: QueryEventKind, callback: &Listener<QueryEvent>) -> bool {
        self.events.off(kind, callback)
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("config", &self.config)
            .field("hash", &self.hash)
            .field("matches", &self.matches.len())
            .field("dirty", &self.dirty)
            .field("validated_version", &self.validated_version)
            .finish()
    }
}

/// Handle to a memoized query registered in a [`World`].
///
/// Reads revalidate the query against the world first.
///
/// ```
/// use sparse_ecs::World;
///
/// let mut world = World::new();
/// let e = world.create();
/// world.add_component(e, "hp", 100u32);
///
/// assert_eq!(&*world.include(["hp"]).entities(), &[e]);
/// ```
#[derive(Clone, Copy)]
pub struct QueryRef<'w> {
    world: &'w World,
    hash: QueryHash,
    slot: usize,
}

impl<'w> QueryRef<'w> {
    pub(crate) fn new(world: &'w World, hash: QueryHash, slot: usize) -> Self {
        Self { world, hash, slot }
    }

    pub fn hash(&self) -> QueryHash {
        self.hash
    }

    /// Normalized filter of this query
    pub fn config(&self) -> QueryConfig {
        self.world
            .with_query(self.hash, self.slot, |query| query.config().clone())
            .unwrap_or_default()
    }

    /// Current matching entities
    pub fn entities(&self) -> Rc<[EntityId]> {
        self.world
            .with_validated_query(self.hash, self.slot, Query::entities)
            .unwrap_or_else(|| Rc::from(Vec::new()))
    }

    /// Current matching entities as an owned set
    pub fn ids(&self) -> SparseSet<EntityId> {
        self.world
            .with_validated_query(self.hash, self.slot, |query| query.ids().clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.world
            .with_validated_query(self.hash, self.slot, |query| query.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.world
            .with_validated_query(self.hash, self.slot, |query| query.contains(id))
            .unwrap_or(false)
    }

    /// Memoized query requiring `keys` (independent of this one)
    pub fn include<I, S>(&self, keys: I) -> QueryRef<'w>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.world.include(keys)
    }

    /// Memoized query forbidding `keys` (independent of this one)
    pub fn exclude<I, S>(&self, keys: I) -> QueryRef<'w>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.world.exclude(keys)
    }

    pub fn on(&self, kind: QueryEventKind, callback: Listener<QueryEvent>) -> Option<ListenerId> {
        self.world
            .with_query(self.hash, self.slot, |query| query.on(kind, callback))
    }

    pub fn once(&self, kind: QueryEventKind, callback: Listener<QueryEvent>) -> Option<ListenerId> {
        self.world
            .with_query(self.hash, self.slot, |query| query.once(kind, callback))
    }

    pub fn off(&self, kind: QueryEventKind, callback: &Listener<QueryEvent>) -> bool {
        self.world
            .with_query(self.hash, self.slot, |query| query.off(kind, callback))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for QueryRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRef")
            .field("hash", &self.hash)
            .field("slot", &self.slot)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::listener;
    use std::cell::RefCell;

    fn setup() -> (EntityManager, ComponentManager) {
        (EntityManager::new(), ComponentManager::new())
    }

    #[test]
    fn test_hash_known_values() {
        let ab = QueryConfig::new().with_include(["a", "b"]);
        assert_eq!(Query::get_hash(&ab), -1_188_234_234);
        assert_eq!(Query::get_hash(&ab), Query::get_hash(&ab.clone()));

        let ba = QueryConfig::new().with_include(["b", "a"]);
        assert_eq!(Query::get_hash(&ba), 525_946_950);

        assert_eq!(Query::get_hash(&QueryConfig::new()), -36_424_682);
    }

    #[test]
    fn test_hash_ignores_whitespace_and_empty_keys() {
        let padded = QueryConfig::new().with_include([" hp ", ""]);
        let plain = QueryConfig::new().with_include(["hp"]);
        assert_eq!(Query::get_hash(&padded), Query::get_hash(&plain));
        assert_eq!(Query::get_hash(&plain), -1_238_594_930);
        assert_eq!(padded.normalized(), plain);
    }

    #[test]
    fn test_include_exclude_filter() {
        let (mut entities, mut components) = setup();
        let e1 = entities.create();
        let e2 = entities.create();
        let e3 = entities.create();
        components.add_component(e1, "a", ());
        components.add_component(e1, "b", ());
        components.add_component(e2, "a", ());
        components.add_component(e3, "b", ());

        let mut query = Query::new(QueryConfig::new().with_include(["a"]).with_exclude(["b"]));
        assert!(query.check_entities(&entities, &components, 1));
        assert_eq!(&*query.entities(), &[e2]);
    }

    #[test]
    fn test_fast_path_skips_clean_query() {
        let (mut entities, components) = setup();
        entities.create();
        let mut query = Query::new(QueryConfig::new());
        assert!(query.check_entities(&entities, &components, 1));
        assert!(!query.check_entities(&entities, &components, 1));
        assert!(!query.check_entities(&entities, &components, 2));

        query.mark_dirty(EntityId::from_raw(0), 1);
        assert!(!query.check_entities(&entities, &components, 1));
        assert!(query.check_entities(&entities, &components, 2));
        assert_eq!(query.validated_version(), Some(2));
    }

    #[test]
    fn test_incremental_pass_adds_and_removes() {
        let (mut entities, mut components) = setup();
        let e = entities.create();
        let mut query = Query::new(QueryConfig::new().with_include(["hp"]));
        query.check_entities(&entities, &components, 0);
        assert!(query.is_empty());

        components.add_component(e, "hp", 100u32);
        query.mark_dirty(e, entities.len());
        query.check_entities(&entities, &components, 1);
        assert!(query.contains(e));

        components.remove_component(e, "hp");
        query.mark_dirty(e, entities.len());
        query.check_entities(&entities, &components, 2);
        assert!(!query.contains(e));
    }

    #[test]
    fn test_destroyed_entity_is_dropped() {
        let (mut entities, mut components) = setup();
        let e = entities.create();
        components.add_component(e, "hp", 1u32);
        let mut query = Query::new(QueryConfig::new().with_include(["hp"]));
        query.check_entities(&entities, &components, 0);
        assert_eq!(query.len(), 1);

        // destroyed without clearing the row: liveness alone must evict it
        entities.destroy(e);
        query.mark_dirty(e, entities.len());
        query.check_entities(&entities, &components, 1);
        assert!(query.is_empty());
    }

    #[test]
    fn test_pending_set_bounded_by_live_count() {
        let (mut entities, mut components) = setup();
        let kept = entities.create();
        components.add_component(kept, "hp", 1u32);
        let mut query = Query::new(QueryConfig::new().with_include(["hp"]));
        query.check_entities(&entities, &components, 0);

        let gone = entities.create();
        query.mark_dirty(gone, entities.len());
        assert_eq!(query.pending_len(), 1);
        entities.destroy(gone);
        query.mark_dirty(kept, entities.len());
        assert_eq!(query.pending_len(), 0);

        assert!(query.check_entities(&entities, &components, 1));
        assert_eq!(&*query.entities(), &[kept]);
    }

    #[test]
    fn test_mark_all_dirty_rescans() {
        let (mut entities, mut components) = setup();
        let e = entities.create();
        let mut query = Query::new(QueryConfig::new().with_include(["tag"]));
        query.check_entities(&entities, &components, 5);

        // change without marking the entity
        components.add_component(e, "tag", ());
        assert!(!query.check_entities(&entities, &components, 5));
        query.mark_all_dirty();
        assert!(query.check_entities(&entities, &components, 5));
        assert!(query.contains(e));
    }

    #[test]
    fn test_membership_events() {
        let (mut entities, mut components) = setup();
        let e = entities.create();
        let mut query = Query::new(QueryConfig::new().with_include(["hp"]));
        let log = Rc::new(RefCell::new(Vec::new()));
        for kind in [QueryEventKind::Added, QueryEventKind::Removed] {
            let l = Rc::clone(&log);
            query.on(kind, listener(move |event: &QueryEvent| l.borrow_mut().push(*event)));
        }

        components.add_component(e, "hp", 3u8);
        query.check_entities(&entities, &components, 1);
        // no duplicate event when the entity keeps matching
        components.add_component(e, "hp", 4u8);
        query.mark_dirty(e, entities.len());
        query.check_entities(&entities, &components, 2);
        query.forget(e);

        assert_eq!(
            *log.borrow(),
            vec![QueryEvent::Added(e), QueryEvent::Removed(e)]
        );
    }

    #[test]
    fn test_entities_snapshot_above_threshold() {
        let (mut entities, mut components) = setup();
        for _ in 0..3 {
            let e = entities.create();
            components.add_component(e, "p", ());
        }
        let mut query = Query::new(QueryConfig::new().with_include(["p"])).with_cache_threshold(2);
        query.check_entities(&entities, &components, 1);

        let first = query.entities();
        let second = query.entities();
        assert!(Rc::ptr_eq(&first, &second));

        query.forget(first[0]);
        let third = query.entities();
        assert_eq!(third.len(), 2);
        assert!(!Rc::ptr_eq(&first, &third));
    }
}
