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

//! Listener registry keyed by target identifier and event name.

use courier_core::{Listener, ListenerId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Composite key of a listener bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    /// The target identifier that scopes the event.
    pub target_id: String,
    /// The event name.
    pub event_name: String,
}

impl ListenerKey {
    /// Creates a key for a `(target, event)` pair.
    pub fn new(target_id: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            event_name: event_name.into(),
        }
    }
}

#[derive(Default)]
struct RegistryState {
    last_id: u64,
    buckets: HashMap<ListenerKey, HashMap<ListenerId, Listener>>,
}

/// Thread-safe registry of listeners.
///
/// Every operation holds one mutex over the whole mapping for the duration of
/// the structural change or read, and never while a listener runs. Handles come
/// from a counter guarded by the same mutex, so they are unique and increasing
/// for the lifetime of the registry.
///
/// Iteration order among the listeners of one bucket is unspecified.
#[derive(Default)]
pub struct ListenerRegistry {
    state: Mutex<RegistryState>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // Listeners never run under the lock, so a poisoned guard still holds a
    // consistent map.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `listener` for `(target_id, event_name)` and returns its handle.
    pub fn add_listener(
        &self,
        target_id: impl Into<String>,
        event_name: impl Into<String>,
        listener: Listener,
    ) -> ListenerId {
        let key = ListenerKey::new(target_id, event_name);
        let mut state = self.lock();
        state.last_id += 1;
        let id = ListenerId::new(state.last_id);
        log::debug!(
            "ListenerRegistry: Added listener {} for {}:{}",
            id,
            key.target_id,
            key.event_name
        );
        state.buckets.entry(key).or_default().insert(id, listener);
        id
    }

    /// Removes the listener `id` from `(target_id, event_name)`.
    ///
    /// Returns whether a listener was removed. Unknown targets, events and
    /// handles are not an error.
    pub fn remove_listener(&self, target_id: &str, event_name: &str, id: ListenerId) -> bool {
        let key = ListenerKey::new(target_id, event_name);
        let mut state = self.lock();
        let Some(bucket) = state.buckets.get_mut(&key) else {
            return false;
        };
        let removed = bucket.remove(&id).is_some();
        if bucket.is_empty() {
            state.buckets.remove(&key);
        }
        if removed {
            log::debug!(
                "ListenerRegistry: Removed listener {} for {}:{}",
                id,
                target_id,
                event_name
            );
        }
        removed
    }

    /// Removes every listener registered for `target_id` and returns how many were dropped.
    pub fn remove_target(&self, target_id: &str) -> usize {
        let mut state = self.lock();
        let mut removed = 0;
        state.buckets.retain(|key, bucket| {
            if key.target_id == target_id {
                removed += bucket.len();
                false
            } else {
                true
            }
        });
        if removed > 0 {
            log::debug!(
                "ListenerRegistry: Removed {} listener(s) of target {}",
                removed,
                target_id
            );
        }
        removed
    }

    /// Returns a snapshot of the listeners for `(target_id, event_name)`.
    ///
    /// The snapshot is detached from the registry: it may be iterated, and its
    /// listeners invoked, while other threads (or the listeners themselves)
    /// mutate the registry. An unknown pair yields an empty snapshot.
    pub fn lookup(&self, target_id: &str, event_name: &str) -> Vec<(ListenerId, Listener)> {
        let key = ListenerKey::new(target_id, event_name);
        self.lock()
            .buckets
            .get(&key)
            .map(|bucket| {
                bucket
                    .iter()
                    .map(|(id, listener)| (*id, listener.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the number of listeners for `(target_id, event_name)`.
    pub fn listener_count(&self, target_id: &str, event_name: &str) -> usize {
        let key = ListenerKey::new(target_id, event_name);
        self.lock().buckets.get(&key).map_or(0, HashMap::len)
    }

    /// Returns the total number of registered listeners.
    pub fn len(&self) -> usize {
        self.lock().buckets.values().map(HashMap::len).sum()
    }

    /// Returns true if no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.lock().buckets.is_empty()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ListenerRegistry")
            .field("last_id", &state.last_id)
            .field("buckets", &state.buckets.len())
            .finish()
    }
}
