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

//! World: entity, component, query and system orchestration

use ahash::AHashMap;
use smallvec::SmallVec;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace, warn};

#[cfg(feature = "profiling")]
use tracing::info_span;

use crate::component::{Component, ComponentManager};
use crate::config::WorldConfig;
use crate::entity::{EntityId, EntityManager};
use crate::error::{EcsError, Result};
use crate::event::{ComponentEvent, EntityEvent, WorldEvent, WorldEventKind};
use crate::event_bus::{EventRegistry, Listener, ListenerId};
use crate::query::{Query, QueryConfig, QueryHash, QueryRef};
use crate::system::{System, SystemId, SystemManager};
use crate::time::Clock;

/// Queries sharing one hash. More than one entry only on a hash collision.
type QueryBucket = SmallVec<[Query; 1]>;

/// Central ECS world
///
/// Owns the entity and component managers, the memoized query registry and
/// the registered systems. Every structural change goes through the world so
/// it can re-emit the change, bump its version and mark the queries dirty.
pub struct World {
    entities: EntityManager,
    components: ComponentManager,

    /// Memoized queries keyed by filter hash
    queries: RefCell<AHashMap<QueryHash, QueryBucket>>,

    systems: SystemManager,
    events: EventRegistry<WorldEvent>,

    /// Bumped once per structural change
    version: u64,

    config: WorldConfig,

    /// Copied from the clock by `advance`
    delta: Duration,
    elapsed: Duration,
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create a world with preallocated storage
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            entities: EntityManager::with_capacity(config.entity_capacity),
            components: ComponentManager::with_capacity(config.entity_capacity),
            queries: RefCell::new(AHashMap::with_capacity(config.query_capacity)),
            systems: SystemManager::new(),
            events: EventRegistry::new(),
            version: 0,
            config,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Structural version, bumped on every create/destroy/add/remove
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self, entity: EntityId) {
        self.version = self.version.wrapping_add(1);
        let live = self.entities.len();
        for bucket in self.queries.get_mut().values_mut() {
            for query in bucket.iter_mut() {
                query.mark_dirty(entity, live);
            }
        }
    }

    // ---- entities ----

    /// Create an entity with no components
    pub fn create(&mut self) -> EntityId {
        let id = self.entities.create();
        self.events.emit(&WorldEvent::EntityCreated(id));
        self.touch(id);
        id
    }

    /// Destroy `id`, dropping its components and its query memberships.
    ///
    /// `EntityDestroyed` is emitted even if `id` was not alive. Returns
    /// whether it was.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let was_alive = self.entities.destroy(id);
        self.events.emit(&WorldEvent::EntityDestroyed(id));

        self.components.clear_component_schema(id);
        self.touch(id);
        // after touch, so the id does not stay pending
        for bucket in self.queries.get_mut().values_mut() {
            for query in bucket.iter_mut() {
                query.forget(id);
            }
        }
        was_alive
    }

    /// Check if an entity is alive
    pub fn exist(&self, id: EntityId) -> bool {
        self.entities.exist(id)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Read-only handle to a live entity
    pub fn entity(&self, id: EntityId) -> Result<EntityRef<'_>> {
        if !self.exist(id) {
            return Err(EcsError::EntityNotFound(id));
        }
        Ok(EntityRef { world: self, id })
    }

    /// Mutable handle to a live entity
    pub fn entity_mut(&mut self, id: EntityId) -> Result<EntityMut<'_>> {
        if !self.exist(id) {
            return Err(EcsError::EntityNotFound(id));
        }
        Ok(EntityMut { world: self, id })
    }

    // ---- components ----

    /// Insert or overwrite `key` on `entity`.
    ///
    /// Returns `false` without doing anything if `entity` is not alive.
    pub fn add_component<T: Component>(
        &mut self,
        entity: EntityId,
        key: impl Into<String>,
        value: T,
    ) -> bool {
        if !self.entities.exist(entity) {
            trace!(entity = entity.to_raw(), "add_component on dead entity ignored");
            return false;
        }

        let key = key.into();
        self.components.add_boxed(entity, key.clone(), Box::new(value));
        self.events.emit(&WorldEvent::ComponentAdded { entity, key });
        self.touch(entity);
        true
    }

    /// Remove `key` from `entity`. Returns whether it was present.
    pub fn remove_component(&mut self, entity: EntityId, key: &str) -> bool {
        if self.components.remove_component(entity, key).is_none() {
            return false;
        }

        if self.entities.exist(entity) {
            self.events.emit(&WorldEvent::ComponentRemoved {
                entity,
                key: key.to_owned(),
            });
        }
        self.touch(entity);
        true
    }

    /// Get a component by key. `None` if absent or not a `T`.
    pub fn get_component<T: Component>(&self, entity: EntityId, key: &str) -> Option<&T> {
        self.components.get_component(entity, key)
    }

    /// Get a mutable component by key.
    ///
    /// Changing a value does not affect query membership, so this does not
    /// bump the version.
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId, key: &str) -> Option<&mut T> {
        self.components.get_component_mut(entity, key)
    }

    /// Get a component without naming its type
    pub fn get_raw(&self, entity: EntityId, key: &str) -> Option<&dyn Any> {
        self.components.get_raw(entity, key)
    }

    pub fn has_component(&self, entity: EntityId, key: &str) -> bool {
        self.components.has_component(entity, key)
    }

    // ---- queries ----

    /// Memoized query for `config`, created on first use.
    ///
    /// Filters are memoized by [`Query::get_hash`]: the same keys in a
    /// different order make a distinct query.
    pub fn query(&self, config: QueryConfig) -> QueryRef<'_> {
        let config = config.normalized();
        let hash = Query::get_hash(&config);

        let mut queries = self.queries.borrow_mut();
        let bucket = queries.entry(hash).or_default();
        let slot = match bucket.iter().position(|query| query.config() == &config) {
            Some(slot) => slot,
            None => {
                if !bucket.is_empty() {
                    warn!(
                        hash,
                        include = ?config.include,
                        exclude = ?config.exclude,
                        "query hash collision"
                    );
                }
                debug!(
                    hash,
                    include = ?config.include,
                    exclude = ?config.exclude,
                    "query created"
                );
                bucket.push(
                    Query::new(config).with_cache_threshold(self.config.entity_cache_threshold),
                );
                bucket.len() - 1
            }
        };

        QueryRef::new(self, hash, slot)
    }

    /// Entities holding every key in `keys`
    pub fn include<I, S>(&self, keys: I) -> QueryRef<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query(QueryConfig::new().with_include(keys))
    }

    /// Entities holding none of `keys`
    pub fn exclude<I, S>(&self, keys: I) -> QueryRef<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query(QueryConfig::new().with_exclude(keys))
    }

    pub(crate) fn with_query<R>(
        &self,
        hash: QueryHash,
        slot: usize,
        f: impl FnOnce(&mut Query) -> R,
    ) -> Option<R> {
        let mut queries = self.queries.borrow_mut();
        let query = queries.get_mut(&hash)?.get_mut(slot)?;
        Some(f(query))
    }

    /// Like `with_query`, after bringing the query up to date
    pub(crate) fn with_validated_query<R>(
        &self,
        hash: QueryHash,
        slot: usize,
        f: impl FnOnce(&mut Query) -> R,
    ) -> Option<R> {
        self.with_query(hash, slot, |query| {
            query.check_entities(&self.entities, &self.components, self.version);
            f(query)
        })
    }

    /// Number of memoized queries
    pub fn query_count(&self) -> usize {
        self.queries.borrow().values().map(SmallVec::len).sum()
    }

    /// Drop every memoized query and its listeners
    pub fn clear_queries(&mut self) {
        self.queries.get_mut().clear();
    }

    // ---- events ----

    pub fn on(&mut self, kind: WorldEventKind, callback: Listener<WorldEvent>) -> ListenerId {
        self.events.on(kind, callback)
    }

    pub fn once(&mut self, kind: WorldEventKind, callback: Listener<WorldEvent>) -> ListenerId {
        self.events.once(kind, callback)
    }

    pub fn off(&mut self, kind: WorldEventKind, callback: &Listener<WorldEvent>) -> bool {
        self.events.off(kind, callback)
    }

    /// Listeners on the entity manager's own `create`/`destroy` events
    pub fn entity_events_mut(&mut self) -> &mut EventRegistry<EntityEvent> {
        self.entities.events_mut()
    }

    /// Listeners on the component manager's own `add`/`remove` events
    pub fn component_events_mut(&mut self) -> &mut EventRegistry<ComponentEvent> {
        self.components.events_mut()
    }

    pub fn entity_manager(&self) -> &EntityManager {
        &self.entities
    }

    pub fn component_manager(&self) -> &ComponentManager {
        &self.components
    }

    // ---- systems ----

    /// Register a system. `init` runs first; a failing `init` leaves the
    /// system unregistered.
    pub fn add_system<S: System>(&mut self, mut system: S) -> Result<SystemId> {
        system.init(self)?;
        let id = self.systems.insert(Box::new(system));
        debug!(
            system = self.systems.name(id).unwrap_or_default(),
            priority = self.systems.priority(id).unwrap_or_default(),
            "system added"
        );
        Ok(id)
    }

    /// Unregister a system and run its `exit` hook.
    ///
    /// A system removed while it runs gets its `exit` call once its update
    /// returns.
    pub fn remove_system(&mut self, id: SystemId) -> Result<()> {
        match self.systems.remove(id)? {
            Some(mut system) => {
                debug!(system = system.name(), "system removed");
                system.exit(self)
            }
            None => Ok(()),
        }
    }

    pub fn has_system(&self, id: SystemId) -> bool {
        self.systems.contains(id)
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn systems(&self) -> &SystemManager {
        &self.systems
    }

    /// Run every system once in ascending priority order, then emit
    /// `Updated`.
    ///
    /// Stops at the first failing system. Systems added during the frame
    /// first run on the next one; systems removed during the frame do not
    /// run again.
    pub fn update(&mut self) -> Result<()> {
        #[cfg(feature = "profiling")]
        let span = info_span!("world.update", systems = self.systems.len());
        #[cfg(feature = "profiling")]
        let _span_guard = span.enter();

        let order: SmallVec<[SystemId; 16]> = self.systems.order().iter().copied().collect();
        for id in order {
            let Some(mut system) = self.systems.take(id) else {
                continue;
            };

            #[cfg(feature = "profiling")]
            let system_span = info_span!("system.update", name = system.name());
            #[cfg(feature = "profiling")]
            let _system_guard = system_span.enter();

            let result = system.update(self);

            if let Some(mut orphan) = self.systems.restore(id, system) {
                debug!(system = orphan.name(), "system removed during its own update");
                orphan.exit(self)?;
            }
            result?;
        }

        self.events.emit(&WorldEvent::Updated);
        Ok(())
    }

    /// Copy the clock's timing into the world and run [`World::update`]
    pub fn advance(&mut self, clock: &Clock) -> Result<()> {
        self.delta = clock.delta();
        self.elapsed = clock.elapsed();
        self.update()
    }

    /// Clock delta of the current frame
    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Clock elapsed time of the current frame
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.len())
            .field("queries", &self.query_count())
            .field("systems", &self.systems)
            .field("version", &self.version)
            .finish()
    }
}

/// Read-only view of a live entity
#[derive(Clone, Copy)]
pub struct EntityRef<'w> {
    world: &'w World,
    id: EntityId,
}

impl<'w> EntityRef<'w> {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn has(&self, key: &str) -> bool {
        self.world.has_component(self.id, key)
    }

    pub fn get<T: Component>(&self, key: &str) -> Option<&'w T> {
        let world: &'w World = self.world;
        world.get_component(self.id, key)
    }

    /// Keys stored on this entity, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &'w str> + 'w {
        let world: &'w World = self.world;
        world.components.component_keys(self.id)
    }
}

impl fmt::Debug for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("id", &self.id)
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Mutable view of a live entity
pub struct EntityMut<'w> {
    world: &'w mut World,
    id: EntityId,
}

impl EntityMut<'_> {
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Insert or overwrite `key`
    pub fn add<T: Component>(&mut self, key: impl Into<String>, value: T) -> &mut Self {
        self.world.add_component(self.id, key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.world.remove_component(self.id, key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.world.has_component(self.id, key)
    }

    pub fn get<T: Component>(&self, key: &str) -> Option<&T> {
        self.world.get_component(self.id, key)
    }

    pub fn get_mut<T: Component>(&mut self, key: &str) -> Option<&mut T> {
        self.world.get_component_mut(self.id, key)
    }

    /// Destroy the entity, consuming the handle
    pub fn destroy(self) -> bool {
        self.world.destroy(self.id)
    }
}

impl fmt::Debug for EntityMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityMut").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::listener;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_create_destroy() {
        let mut world = World::new();
        let a = world.create();
        let b = world.create();
        assert_eq!(world.entity_count(), 2);
        assert!(world.destroy(a));
        assert!(!world.exist(a));
        assert!(world.exist(b));
        assert!(!world.destroy(a));
        assert_eq!(world.entity_count(), 1);
    }

    #[test]
    fn test_add_component_to_dead_entity() {
        let mut world = World::new();
        let e = world.create();
        world.destroy(e);
        let version = world.version();

        assert!(!world.add_component(e, "hp", 10u32));
        assert!(!world.has_component(e, "hp"));
        assert_eq!(world.version(), version);
    }

    #[test]
    fn test_destroy_drops_components() {
        let mut world = World::new();
        let e = world.create();
        world.add_component(e, "hp", 10u32);
        world.destroy(e);
        assert!(world.get_component::<u32>(e, "hp").is_none());
        assert_eq!(world.component_manager().row_count(), 0);
    }

    #[test]
    fn test_version_bumps_once_per_change() {
        let mut world = World::new();
        let e = world.create();
        assert_eq!(world.version(), 1);
        world.add_component(e, "a", ());
        assert_eq!(world.version(), 2);
        assert!(!world.remove_component(e, "missing"));
        assert_eq!(world.version(), 2);
        world.remove_component(e, "a");
        world.destroy(e);
        assert_eq!(world.version(), 4);
    }

    #[test]
    fn test_query_memoized() {
        let world = World::new();
        let a = world.include(["pos", "vel"]);
        let b = world.query(QueryConfig::new().with_include([" pos", "vel "]));
        assert_eq!(a.hash(), b.hash());
        assert_eq!(world.query_count(), 1);

        // declared order matters
        world.include(["vel", "pos"]);
        assert_eq!(world.query_count(), 2);
    }

    #[test]
    fn test_query_tracks_mutations() {
        let mut world = World::new();
        let e = world.create();
        assert!(world.include(["hp"]).is_empty());

        world.add_component(e, "hp", 5i32);
        assert!(world.include(["hp"]).contains(e));

        world.remove_component(e, "hp");
        assert!(world.include(["hp"]).is_empty());

        world.add_component(e, "hp", 5i32);
        world.destroy(e);
        assert!(world.include(["hp"]).is_empty());
    }

    #[test]
    fn test_unread_query_does_not_accumulate_churn() {
        let mut world = World::new();
        let survivor = world.create();
        world.add_component(survivor, "bullet", ());
        assert_eq!(world.include(["bullet"]).len(), 1);

        for _ in 0..10_000 {
            let e = world.create();
            world.add_component(e, "bullet", ());
            world.destroy(e);
        }

        let pending: usize = world
            .queries
            .borrow()
            .values()
            .flat_map(|bucket| bucket.iter())
            .map(Query::pending_len)
            .sum();
        assert!(pending <= world.entity_count());
        assert_eq!(&*world.include(["bullet"]).entities(), &[survivor]);
    }

    #[test]
    fn test_world_events() {
        let mut world = World::new();
        let removed = Rc::new(Cell::new(0));
        let r = Rc::clone(&removed);
        world.on(
            WorldEventKind::ComponentRemoved,
            listener(move |_: &WorldEvent| r.set(r.get() + 1)),
        );

        let e = world.create();
        world.add_component(e, "hp", 1u8);
        world.remove_component(e, "hp");
        world.add_component(e, "hp", 1u8);
        // row cleared on destroy without a removal event
        world.destroy(e);
        assert_eq!(removed.get(), 1);
    }

    #[test]
    fn test_entity_handles() -> Result<()> {
        let mut world = World::new();
        let e = world.create();
        world.entity_mut(e)?.add("name", String::from("hero")).add("hp", 3u32);

        let view = world.entity(e)?;
        assert_eq!(view.get::<String>("name").map(String::as_str), Some("hero"));
        assert_eq!(view.keys().count(), 2);

        *world.entity_mut(e)?.get_mut::<u32>("hp").unwrap() += 1;
        assert_eq!(world.get_component::<u32>(e, "hp"), Some(&4));

        assert!(world.entity_mut(e)?.destroy());
        assert_eq!(world.entity(e).err(), Some(EcsError::EntityNotFound(e)));
        Ok(())
    }

    #[test]
    fn test_with_config() {
        let world = World::with_config(WorldConfig {
            entity_cache_threshold: 0,
            ..WorldConfig::default()
        });
        assert_eq!(world.config().entity_cache_threshold, 0);
        assert_eq!(world.entity_count(), 0);
    }
}
