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

//! Error types

use std::fmt;

use crate::entity::EntityId;

/// ECS error type
///
/// Most world operations are silent no-ops on missing entities or
/// components; this type covers the calls that report failures explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Entity is not alive in this world
    EntityNotFound(EntityId),

    /// System handle does not belong to a registered system
    SystemNotFound,

    /// A system hook failed
    SystemError { system: String, message: String },

    /// Configuration could not be parsed
    ConfigError(String),

    /// Log subscriber could not be installed
    SubscriberInit(String),
}

impl EcsError {
    /// Build a system failure for the named system
    pub fn system(system: impl Into<String>, message: impl Into<String>) -> Self {
        EcsError::SystemError {
            system: system.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::EntityNotFound(id) => write!(f, "Entity not found: {id}"),
            EcsError::SystemNotFound => write!(f, "System not found"),
            EcsError::SystemError { system, message } => {
                write!(f, "System '{system}' failed: {message}")
            }
            EcsError::ConfigError(msg) => write!(f, "Config error: {msg}"),
            EcsError::SubscriberInit(msg) => write!(f, "Subscriber init error: {msg}"),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<serde_json::Error> for EcsError {
    fn from(err: serde_json::Error) -> Self {
        EcsError::ConfigError(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;
