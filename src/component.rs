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

//! Component table
//!
//! Components are keyed by name per entity. Values are type-erased and
//! recovered with a typed downcast at the call site, so one entity can hold
//! components of any `'static` type under string keys.

use ahash::AHashMap;
use std::any::Any;
use std::fmt;

use crate::entity::EntityId;
use crate::event::{ComponentEvent, ComponentEventKind};
use crate::event_bus::{EventRegistry, Listener, ListenerId};

/// Marker trait for components
///
/// Components must be 'static (no borrowed data)
pub trait Component: 'static {}

/// Automatically implement Component for all valid types
impl<T: 'static> Component for T {}

/// Type-erased component value
pub type ComponentValue = Box<dyn Any>;

type ComponentRow = AHashMap<String, ComponentValue>;

/// Per-entity map from component key to component value.
///
/// An entity without components has no row. The manager knows nothing about
/// entity liveness; the owning world checks it before inserting.
#[derive(Default)]
pub struct ComponentManager {
    rows: AHashMap<EntityId, ComponentRow>,
    events: EventRegistry<ComponentEvent>,
}

impl ComponentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with room for `capacity` entity rows
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: AHashMap::with_capacity(capacity),
            events: EventRegistry::new(),
        }
    }

    /// Insert or overwrite `key` on `entity` and emit `add`.
    ///
    /// Returns the overwritten value, if any.
    pub fn add_component<T: Component>(
        &mut self,
        entity: EntityId,
        key: impl Into<String>,
        value: T,
    ) -> Option<ComponentValue> {
        self.add_boxed(entity, key.into(), Box::new(value))
    }

    /// Insert an already boxed value. `add` is emitted on overwrite too.
    pub fn add_boxed(
        &mut self,
        entity: EntityId,
        key: String,
        value: ComponentValue,
    ) -> Option<ComponentValue> {
        let previous = self
            .rows
            .entry(entity)
            .or_default()
            .insert(key.clone(), value);

        self.events.emit(&ComponentEvent::Added { entity, key });
        previous
    }

    /// Get a component by key. `None` if the entity has no row, lacks the
    /// key, or the value is not a `T`.
    pub fn get_component<T: Component>(&self, entity: EntityId, key: &str) -> Option<&T> {
        self.rows
            .get(&entity)?
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Get a mutable component by key
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId, key: &str) -> Option<&mut T> {
        self.rows
            .get_mut(&entity)?
            .get_mut(key)
            .and_then(|value| value.downcast_mut::<T>())
    }

    /// Get a component without naming its type
    pub fn get_raw(&self, entity: EntityId, key: &str) -> Option<&dyn Any> {
        self.rows
            .get(&entity)?
            .get(key)
            .map(|value| &**value)
    }

    /// Check if `entity` has a component stored under `key`
    pub fn has_component(&self, entity: EntityId, key: &str) -> bool {
        self.rows
            .get(&entity)
            .is_some_and(|row| row.contains_key(key))
    }

    /// Remove `key` from `entity` and emit `remove`.
    ///
    /// No-op without an event if the component is absent. The row is dropped
    /// once its last component goes.
    pub fn remove_component(&mut self, entity: EntityId, key: &str) -> Option<ComponentValue> {
        let row = self.rows.get_mut(&entity)?;
        let (key, value) = row.remove_entry(key)?;
        if row.is_empty() {
            self.rows.remove(&entity);
        }

        self.events.emit(&ComponentEvent::Removed { entity, key });
        Some(value)
    }

    /// Drop the whole row of `entity` without per-key events.
    /// Returns whether a row existed.
    pub fn clear_component_schema(&mut self, entity: EntityId) -> bool {
        self.rows.remove(&entity).is_some()
    }

    /// Keys stored on `entity`, in no particular order
    pub fn component_keys(&self, entity: EntityId) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .get(&entity)
            .into_iter()
            .flat_map(|row| row.keys().map(String::as_str))
    }

    /// Number of components on `entity`
    pub fn component_count(&self, entity: EntityId) -> usize {
        self.rows.get(&entity).map_or(0, |row| row.len())
    }

    /// Number of entities holding at least one component
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn on(&mut self, kind: ComponentEventKind, callback: Listener<ComponentEvent>) -> ListenerId {
        self.events.on(kind, callback)
    }

    pub fn once(
        &mut self,
        kind: ComponentEventKind,
        callback: Listener<ComponentEvent>,
    ) -> ListenerId {
        self.events.once(kind, callback)
    }

    pub fn off(&mut self, kind: ComponentEventKind, callback: &Listener<ComponentEvent>) -> bool {
        self.events.off(kind, callback)
    }

    /// Access the underlying event registry
    pub fn events_mut(&mut self) -> &mut EventRegistry<ComponentEvent> {
        &mut self.events
    }
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("rows", &self.rows.len())
            .field("events", &self.events)
            .finish()
    }
}
