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

//! Error types for the dispatcher lifecycle.
//!
//! Registration, removal and the blocking [`dispatch`](crate::Dispatcher::dispatch)
//! hand-off never fail; only lifecycle transitions, bounded hand-offs and
//! configuration loading report errors.

use std::time::Duration;

/// Result alias used across the dispatch crate.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// An error reported by a [`Dispatcher`](crate::Dispatcher).
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// `start` was called on a dispatcher that is already running.
    #[error("dispatcher is already running")]
    AlreadyStarted,

    /// The dispatcher has been closed and no longer accepts work.
    #[error("dispatcher is closed")]
    Closed,

    /// The dispatch loop did not accept the event within the given time.
    #[error("dispatch loop did not accept the event within {0:?}")]
    Timeout(Duration),

    /// The dispatch thread could not be spawned.
    #[error("failed to spawn dispatch thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The configuration could not be parsed.
    #[error("invalid dispatcher configuration: {0}")]
    Config(#[from] serde_json::Error),
}
