//! Lifecycle events emitted by the entity/component managers, queries,
//! the world and the clock.

use std::time::Duration;

use crate::entity::EntityId;
use crate::event_bus::Event;

/// Entity manager lifecycle events
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityEvent {
    /// Entity id was issued and is now alive
    Created(EntityId),

    /// Entity id was destroyed
    Destroyed(EntityId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityEventKind {
    Create,
    Destroy,
}

impl EntityEvent {
    /// Get the entity involved in this event
    pub fn entity_id(&self) -> EntityId {
        match self {
            EntityEvent::Created(id) | EntityEvent::Destroyed(id) => *id,
        }
    }
}

impl Event for EntityEvent {
    type Kind = EntityEventKind;

    fn kind(&self) -> EntityEventKind {
        match self {
            EntityEvent::Created(_) => EntityEventKind::Create,
            EntityEvent::Destroyed(_) => EntityEventKind::Destroy,
        }
    }

    fn event_name(&self) -> &'static str {
        match self {
            EntityEvent::Created(_) => "create",
            EntityEvent::Destroyed(_) => "destroy",
        }
    }
}

/// Component manager events
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComponentEvent {
    /// Component was inserted or overwritten
    Added { entity: EntityId, key: String },

    /// Component was removed
    Removed { entity: EntityId, key: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentEventKind {
    Add,
    Remove,
}

impl ComponentEvent {
    pub fn entity_id(&self) -> EntityId {
        match self {
            ComponentEvent::Added { entity, .. } | ComponentEvent::Removed { entity, .. } => *entity,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ComponentEvent::Added { key, .. } | ComponentEvent::Removed { key, .. } => key,
        }
    }
}

impl Event for ComponentEvent {
    type Kind = ComponentEventKind;

    fn kind(&self) -> ComponentEventKind {
        match self {
            ComponentEvent::Added { .. } => ComponentEventKind::Add,
            ComponentEvent::Removed { .. } => ComponentEventKind::Remove,
        }
    }

    fn event_name(&self) -> &'static str {
        match self {
            ComponentEvent::Added { .. } => "add",
            ComponentEvent::Removed { .. } => "remove",
        }
    }
}

/// World-level events re-emitted from the sub-managers
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    EntityCreated(EntityId),
    EntityDestroyed(EntityId),
    ComponentAdded { entity: EntityId, key: String },
    ComponentRemoved { entity: EntityId, key: String },

    /// Every system ran for this frame
    Updated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorldEventKind {
    EntityCreated,
    EntityDestroyed,
    ComponentAdded,
    ComponentRemoved,
    Updated,
}

impl WorldEvent {
    /// Get the entity involved in this event, if any
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            WorldEvent::EntityCreated(id) | WorldEvent::EntityDestroyed(id) => Some(*id),
            WorldEvent::ComponentAdded { entity, .. }
            | WorldEvent::ComponentRemoved { entity, .. } => Some(*entity),
            WorldEvent::Updated => None,
        }
    }
}

impl Event for WorldEvent {
    type Kind = WorldEventKind;

    fn kind(&self) -> WorldEventKind {
        match self {
            WorldEvent::EntityCreated(_) => WorldEventKind::EntityCreated,
            WorldEvent::EntityDestroyed(_) => WorldEventKind::EntityDestroyed,
            WorldEvent::ComponentAdded { .. } => WorldEventKind::ComponentAdded,
            WorldEvent::ComponentRemoved { .. } => WorldEventKind::ComponentRemoved,
            WorldEvent::Updated => WorldEventKind::Updated,
        }
    }

    fn event_name(&self) -> &'static str {
        match self {
            WorldEvent::EntityCreated(_) => "entityCreated",
            WorldEvent::EntityDestroyed(_) => "entityDestroyed",
            WorldEvent::ComponentAdded { .. } => "componentAdded",
            WorldEvent::ComponentRemoved { .. } => "componentRemoved",
            WorldEvent::Updated => "updated",
        }
    }
}

/// Query membership changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryEvent {
    /// Entity started matching the filter
    Added(EntityId),

    /// Entity stopped matching or was destroyed
    Removed(EntityId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryEventKind {
    Added,
    Removed,
}

impl QueryEvent {
    pub fn entity_id(&self) -> EntityId {
        match self {
            QueryEvent::Added(id) | QueryEvent::Removed(id) => *id,
        }
    }
}

impl Event for QueryEvent {
    type Kind = QueryEventKind;

    fn kind(&self) -> QueryEventKind {
        match self {
            QueryEvent::Added(_) => QueryEventKind::Added,
            QueryEvent::Removed(_) => QueryEventKind::Removed,
        }
    }

    fn event_name(&self) -> &'static str {
        match self {
            QueryEvent::Added(_) => "added",
            QueryEvent::Removed(_) => "removed",
        }
    }
}

/// Clock tick notification
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClockEvent {
    /// Fired once per external frame, with the values after the tick
    Update { delta: Duration, elapsed: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClockEventKind {
    Update,
}

impl Event for ClockEvent {
    type Kind = ClockEventKind;

    fn kind(&self) -> ClockEventKind {
        ClockEventKind::Update
    }

    fn event_name(&self) -> &'static str {
        "update"
    }
}
