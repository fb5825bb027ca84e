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

//! The dispatcher facade: registration, submission and lifecycle.

use crate::config::DispatcherConfig;
use crate::error::{DispatchError, DispatchResult};
use crate::registry::ListenerRegistry;
use crate::service::DispatchLoop;
use crate::stats::{DispatchStats, StatsSnapshot};
use courier_core::{Event, Listenable, ListenerId};
use crossbeam_channel::{Receiver, SendError, SendTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lifecycle of a [`Dispatcher`]: `Created -> Running -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Built but not started. `dispatch` blocks until the loop starts.
    Created,
    /// The dispatch loop is running.
    Running,
    /// Closed; the loop has exited or is finishing its current event.
    Closed,
}

struct Lifecycle {
    state: LifecycleState,
    // Consumer ends, moved into the loop on start.
    events: Option<Receiver<Event>>,
    shutdown_rx: Option<Receiver<()>>,
    // Never sent on; dropping it is the shutdown signal.
    shutdown_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

/// Routes events to the listeners registered for their `(target, name)` pair.
///
/// Any thread may register and remove listeners or submit events. Delivery
/// happens on one dedicated thread, one event at a time, in the order the
/// loop accepted them. With the default configuration [`dispatch`](Self::dispatch)
/// is a rendezvous: it returns once the loop has taken the event, so a slow
/// listener holds back every later caller.
pub struct Dispatcher {
    config: DispatcherConfig,
    registry: Arc<ListenerRegistry>,
    stats: Arc<DispatchStats>,
    event_tx: Sender<Event>,
    lifecycle: Mutex<Lifecycle>,
}

impl Dispatcher {
    /// Creates a dispatcher. The loop is not running until [`start`](Self::start).
    pub fn new(config: DispatcherConfig) -> Self {
        let (event_tx, event_rx) = crossbeam_channel::bounded(config.queue_capacity);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(0);
        Self {
            config,
            registry: Arc::new(ListenerRegistry::new()),
            stats: Arc::new(DispatchStats::new()),
            event_tx,
            lifecycle: Mutex::new(Lifecycle {
                state: LifecycleState::Created,
                events: Some(event_rx),
                shutdown_rx: Some(shutdown_rx),
                shutdown_tx: Some(shutdown_tx),
                worker: None,
            }),
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `listener` for events named `event_name` emitted by `target_id`.
    ///
    /// The listener returns `true` to be removed after the invocation.
    pub fn add_listener<F>(
        &self,
        target_id: impl Into<String>,
        event_name: impl Into<String>,
        listener: F,
    ) -> ListenerId
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.registry.add_listener(target_id, event_name, Arc::new(listener))
    }

    /// Removes a listener. Unknown targets, events and handles are ignored.
    pub fn remove_listener(&self, target_id: &str, event_name: &str, id: ListenerId) {
        self.registry.remove_listener(target_id, event_name, id);
    }

    /// Removes every listener of `target_id`, returning how many were removed.
    pub fn remove_target(&self, target_id: &str) -> usize {
        self.registry.remove_target(target_id)
    }

    /// Returns the number of listeners registered for `(target_id, event_name)`.
    pub fn listener_count(&self, target_id: &str, event_name: &str) -> usize {
        self.registry.listener_count(target_id, event_name)
    }

    /// Returns a handle that registers listeners on behalf of `target_id`.
    pub fn target(&self, target_id: impl Into<String>) -> TargetListeners {
        TargetListeners {
            target_id: target_id.into(),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Hands `event` to the dispatch loop, blocking until the loop accepts it.
    ///
    /// Before [`start`](Self::start) this waits for the loop to start. Once the
    /// dispatcher is closed the event is dropped with a warning.
    ///
    /// A listener must not call this on its own dispatcher when the queue has
    /// no capacity: the loop cannot take the event while it runs the listener.
    pub fn dispatch(&self, event: Event) {
        if let Err(SendError(event)) = self.event_tx.send(event) {
            log::warn!("Dispatcher is closed, dropping {}.", event);
        }
    }

    /// Like [`dispatch`](Self::dispatch), but gives up after `timeout`.
    pub fn dispatch_timeout(&self, event: Event, timeout: Duration) -> DispatchResult<()> {
        self.event_tx
            .send_timeout(event, timeout)
            .map_err(|err| match err {
                SendTimeoutError::Timeout(_) => DispatchError::Timeout(timeout),
                SendTimeoutError::Disconnected(_) => DispatchError::Closed,
            })
    }

    /// Spawns the dispatch thread.
    ///
    /// A dispatcher runs at most once: starting a running dispatcher returns
    /// [`DispatchError::AlreadyStarted`] and starting a closed one returns
    /// [`DispatchError::Closed`].
    pub fn start(&self) -> DispatchResult<()> {
        let mut lifecycle = self.lock_lifecycle();
        match lifecycle.state {
            LifecycleState::Running => return Err(DispatchError::AlreadyStarted),
            LifecycleState::Closed => return Err(DispatchError::Closed),
            LifecycleState::Created => {}
        }
        let (Some(events), Some(shutdown)) =
            (lifecycle.events.take(), lifecycle.shutdown_rx.take())
        else {
            return Err(DispatchError::Closed);
        };

        let dispatch_loop = DispatchLoop::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.stats),
            events,
            shutdown,
        )
        .remove_panicking_listeners(self.config.remove_panicking_listeners);

        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || dispatch_loop.run());

        match spawned {
            Ok(handle) => {
                lifecycle.worker = Some(handle);
                lifecycle.state = LifecycleState::Running;
                log::info!("Dispatcher started on thread '{}'.", self.config.thread_name);
                Ok(())
            }
            Err(err) => {
                // The consumer ends went down with the closure; nothing can be
                // delivered any more.
                lifecycle.state = LifecycleState::Closed;
                lifecycle.shutdown_tx = None;
                log::error!("Failed to spawn dispatch thread: {}", err);
                Err(DispatchError::Spawn(err))
            }
        }
    }

    /// Stops the dispatch loop.
    ///
    /// The loop finishes the event it is delivering, if any, and exits. Unless
    /// called from a listener, this waits for the dispatch thread to finish.
    /// Closing an already closed dispatcher does nothing.
    pub fn close(&self) {
        let worker = {
            let mut lifecycle = self.lock_lifecycle();
            if lifecycle.state == LifecycleState::Closed {
                return;
            }
            lifecycle.state = LifecycleState::Closed;
            lifecycle.shutdown_tx = None;
            lifecycle.events = None;
            lifecycle.shutdown_rx = None;
            lifecycle.worker.take()
        };

        let Some(handle) = worker else {
            log::info!("Dispatcher closed before it was started.");
            return;
        };
        if handle.thread().id() == thread::current().id() {
            log::debug!("Dispatcher closed from its own dispatch thread.");
            return;
        }
        if handle.join().is_err() {
            log::error!("Dispatch thread panicked.");
        }
        log::info!("Dispatcher closed.");
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lock_lifecycle().state
    }

    /// Returns the delivery counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the configuration this dispatcher was built with.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Listener registration scoped to one target.
///
/// Obtained from [`Dispatcher::target`]. Cheap to clone; it shares the
/// dispatcher's registry, so listeners added through it are delivered by that
/// dispatcher.
#[derive(Clone)]
pub struct TargetListeners {
    target_id: String,
    registry: Arc<ListenerRegistry>,
}

impl TargetListeners {
    /// The target this handle registers for.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Removes every listener of this target.
    pub fn off_all(&self) -> usize {
        self.registry.remove_target(&self.target_id)
    }
}

impl Listenable for TargetListeners {
    fn on<F>(&self, event_name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event) -> bool + Send + Sync + 'static,
    {
        self.registry.add_listener(self.target_id.as_str(), event_name, Arc::new(listener))
    }

    fn off(&self, event_name: &str, id: ListenerId) {
        self.registry.remove_listener(&self.target_id, event_name, id);
    }
}

impl std::fmt::Debug for TargetListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetListeners")
            .field("target_id", &self.target_id)
            .finish()
    }
}
