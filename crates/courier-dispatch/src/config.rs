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

//! Dispatcher configuration.

use crate::error::DispatchResult;
use serde::Deserialize;

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Name given to the dispatch thread.
    pub thread_name: String,
    /// Number of events that may wait between `dispatch` callers and the loop.
    /// Zero makes every `dispatch` a rendezvous with the loop. Buffered events
    /// still pending at close are delivered before the loop exits.
    pub queue_capacity: usize,
    /// Whether a listener that panics is unregistered.
    /// When false it stays registered and is invoked again for later events.
    pub remove_panicking_listeners: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            thread_name: "courier-dispatch".to_string(),
            queue_capacity: 0,
            remove_panicking_listeners: false,
        }
    }
}

impl DispatcherConfig {
    /// Parses a configuration from JSON. Missing fields take their default.
    pub fn from_json_str(raw: &str) -> DispatchResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
