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

//! Entity identifiers and the live-entity registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{trace, warn};

use crate::event::{EntityEvent, EntityEventKind};
use crate::event_bus::{EventRegistry, Listener, ListenerId};
use crate::sparse_set::SparseSet;

/// Unique entity identifier.
///
/// Ids come from a monotonic counter starting at 0 and are never reused
/// within a world, even after the entity is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Wrap a raw id
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric id
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owns the set of live entity ids and issues new ones
#[derive(Debug, Default)]
pub struct EntityManager {
    entities: SparseSet<EntityId>,
    next_id: u64,
    events: EventRegistry<EntityEvent>,
}

impl EntityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with room for `capacity` live entities
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: SparseSet::with_capacity(capacity),
            next_id: 0,
            events: EventRegistry::new(),
        }
    }

    /// Issue the next id, mark it alive and emit `create`.
    ///
    /// # Panics
    /// Panics if the id counter overflows `u64`. Ids are never reclaimed, so
    /// this is the only hard capacity limit of a world.
    pub fn create(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = match self.next_id.checked_add(1) {
            Some(next) => next,
            None => panic!("Entity id counter overflow at {}", self.next_id),
        };

        self.entities.add(id);
        trace!(entity = id.0, "entity created");
        self.events.emit(&EntityEvent::Created(id));
        id
    }

    /// Check if `id` is alive
    #[inline]
    pub fn exist(&self, id: EntityId) -> bool {
        self.entities.has(&id)
    }

    /// Remove `id` from the live set and emit `destroy`.
    ///
    /// The event is emitted even when `id` was not alive. Returns whether it
    /// was alive.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let was_alive = self.entities.remove(&id);
        if was_alive {
            trace!(entity = id.0, "entity destroyed");
        } else {
            warn!(entity = id.0, "destroy called on an entity that is not alive");
        }
        self.events.emit(&EntityEvent::Destroyed(id));
        was_alive
    }

    /// Number of live entities
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Live entity set
    pub fn entities(&self) -> &SparseSet<EntityId> {
        &self.entities
    }

    /// Id the next `create` call will return
    pub fn next_id(&self) -> EntityId {
        EntityId(self.next_id)
    }

    pub fn on(&mut self, kind: EntityEventKind, callback: Listener<EntityEvent>) -> ListenerId {
        self.events.on(kind, callback)
    }

    pub fn once(&mut self, kind: EntityEventKind, callback: Listener<EntityEvent>) -> ListenerId {
        self.events.once(kind, callback)
    }

    pub fn off(&mut self, kind: EntityEventKind, callback: &Listener<EntityEvent>) -> bool {
        self.events.off(kind, callback)
    }

    /// Access the underlying event registry
    pub fn events_mut(&mut self) -> &mut EventRegistry<EntityEvent> {
        &mut self.events
    }
}
