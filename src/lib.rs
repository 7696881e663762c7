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

//! Sparse ECS - keyed Entity Component System
//!
//! Entities are plain ids, components are any `'static` value stored under a
//! string key, and queries are memoized include/exclude filters that
//! revalidate incrementally as the world changes.
//!
//! ```
//! use sparse_ecs::prelude::*;
//!
//! let mut world = World::new();
//! let e = world.create();
//! world.add_component(e, "position", (0.0f32, 0.0f32));
//! world.add_component(e, "velocity", (1.0f32, 0.5f32));
//!
//! let moving = world.include(["position", "velocity"]);
//! assert_eq!(moving.len(), 1);
//! ```

pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod prelude;
pub mod query;
pub mod sparse_set;
pub mod system;
pub mod time;
pub mod world;

#[cfg(feature = "profiling")]
pub mod profiling;


pub use component::*;
pub use config::WorldConfig;
pub use entity::*;
pub use error::*;
pub use event::*;
pub use event_bus::*;
pub use query::*;
pub use sparse_set::SparseSet;
pub use system::*;
pub use time::Clock;
pub use world::*;
