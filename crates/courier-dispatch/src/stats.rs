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

//! Delivery counters maintained by the dispatch loop.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters updated by the dispatch loop and read from any thread.
#[derive(Debug, Default)]
pub struct DispatchStats {
    events_received: AtomicU64,
    invocations: AtomicU64,
    self_removals: AtomicU64,
    panics: AtomicU64,
}

/// A point-in-time copy of [`DispatchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Events taken off the hand-off channel by the loop.
    pub events_received: u64,
    /// Listener invocations, including ones that panicked.
    pub invocations: u64,
    /// Listeners unregistered because they returned `true`.
    pub self_removals: u64,
    /// Listener invocations that panicked.
    pub panics: u64,
}

impl DispatchStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_event(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_self_removal(&self) {
        self.self_removals.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            invocations: self.invocations.load(Ordering::Relaxed),
            self_removals: self.self_removals.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
        }
    }
}
