//! Convenient re-exports of commonly used types.
//!
//! The prelude can be imported with:
//! ```
//! use sparse_ecs::prelude::*;
//! ```

pub use crate::component::Component;
pub use crate::entity::EntityId;
pub use crate::error::{EcsError, Result};
pub use crate::event::{
    ClockEvent, ClockEventKind, ComponentEvent, ComponentEventKind, EntityEvent, EntityEventKind,
    QueryEvent, QueryEventKind, WorldEvent, WorldEventKind,
};
pub use crate::event_bus::{listener, Listener, ListenerId};
pub use crate::query::{QueryConfig, QueryRef};
pub use crate::system::{System, SystemId};
pub use crate::time::Clock;
pub use crate::world::{EntityMut, EntityRef, World};
pub use crate::WorldConfig;
