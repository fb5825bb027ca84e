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

//! Listener callbacks, their handles, and the target-scoped registration contract.

use crate::event::Event;
use std::fmt;
use std::sync::Arc;

/// A callback invoked when a matching event is dispatched.
///
/// The returned boolean asks the dispatcher to remove the listener once the
/// invocation returns: `true` unregisters it, `false` keeps it registered.
pub type Listener = Arc<dyn Fn(&Event) -> bool + Send + Sync>;

/// Handle returned when a listener is registered.
///
/// Handles are issued by a monotonically increasing counter, starting at 1,
/// and are never reused by the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Wraps a raw handle value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw handle value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A component that accepts listeners for the events it emits.
///
/// Implementors are scoped to one target identifier, so callers only name the
/// event.
pub trait Listenable {
    /// Registers `listener` for `event_name` on this target and returns its handle.
    fn on<F>(&self, event_name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static;

    /// Removes the listener registered under `id` for `event_name`.
    ///
    /// Unknown events or handles are ignored.
    fn off(&self, event_name: &str, id: ListenerId);
}
