// Copyright 2025 eraflo
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

//! Runtime configuration for an [`EventEmitter`](crate::EventEmitter).

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for an event emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Name prefix for threads launched by the default async dispatcher.
    /// The listener id is appended, e.g. `relay-async-12`.
    pub async_thread_name: String,
    /// Stack size in bytes for async threads. `None` uses the platform default.
    pub async_stack_size: Option<usize>,
    /// A warning is logged each time a thread's pending queue reaches a
    /// multiple of this depth. Zero disables the warning.
    pub pending_warn_threshold: usize,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            async_thread_name: "relay-async".to_string(),
            async_stack_size: None,
            pending_warn_threshold: 1024,
        }
    }
}

impl EmitterConfig {
    /// Load a configuration from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save the configuration to a JSON file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
