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

//! The serialized dispatch loop.

use crate::registry::ListenerRegistry;
use crate::stats::DispatchStats;
use courier_core::Event;
use crossbeam_channel::{select, Receiver};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// The consumer side of a dispatcher.
///
/// Takes one event at a time off the hand-off channel and invokes every
/// listener registered for the event's `(target, name)` pair before taking the
/// next one. The loop exits when the shutdown channel disconnects.
pub struct DispatchLoop {
    registry: Arc<ListenerRegistry>,
    stats: Arc<DispatchStats>,
    events: Receiver<Event>,
    shutdown: Receiver<()>,
    remove_panicking_listeners: bool,
}

impl DispatchLoop {
    /// Creates a loop reading `events` until `shutdown` disconnects.
    pub fn new(
        registry: Arc<ListenerRegistry>,
        stats: Arc<DispatchStats>,
        events: Receiver<Event>,
        shutdown: Receiver<()>,
    ) -> Self {
        Self {
            registry,
            stats,
            events,
            shutdown,
            remove_panicking_listeners: false,
        }
    }

    /// Sets whether listeners that panic are unregistered.
    pub fn remove_panicking_listeners(mut self, remove: bool) -> Self {
        self.remove_panicking_listeners = remove;
        self
    }

    /// Runs until shutdown is signalled, blocking the current thread.
    ///
    /// An event already taken off the channel is fully delivered before the
    /// shutdown signal is looked at again. Events sitting in a buffered channel
    /// when shutdown arrives are delivered before the loop exits; callers still
    /// blocked in a send are not served.
    pub fn run(self) {
        log::info!("Dispatch loop started.");
        loop {
            select! {
                recv(self.events) -> msg => match msg {
                    Ok(event) => self.deliver(&event),
                    Err(_) => break,
                },
                recv(self.shutdown) -> _ => break,
            }
        }

        let buffered = self.events.len();
        if buffered > 0 {
            log::debug!("Draining {} buffered event(s) before exit.", buffered);
        }
        for event in self.events.try_iter().take(buffered) {
            self.deliver(&event);
        }
        log::info!("Dispatch loop stopped.");
    }

    /// Delivers one event to the listeners registered for it.
    ///
    /// Listeners are taken from a snapshot so they may add or remove listeners
    /// while they run. A listener returning `true` is removed right after its
    /// invocation. A panicking listener is logged and does not stop delivery.
    pub fn deliver(&self, event: &Event) {
        self.stats.record_event();
        let listeners = self.registry.lookup(event.target_id(), event.name());
        log::trace!("Delivering {} to {} listener(s).", event, listeners.len());

        for (id, listener) in listeners {
            self.stats.record_invocation();
            match panic::catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(true) => {
                    self.registry.remove_listener(event.target_id(), event.name(), id);
                    self.stats.record_self_removal();
                }
                Ok(false) => {}
                Err(payload) => {
                    self.stats.record_panic();
                    log::error!(
                        "Listener {} for {} panicked: {}",
                        id,
                        event,
                        panic_message(payload.as_ref())
                    );
                    if self.remove_panicking_listeners {
                        self.registry.remove_listener(event.target_id(), event.name(), id);
                    }
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread;

    fn counting(counter: &Arc<AtomicUsize>, remove: bool) -> courier_core::Listener {
        let counter = Arc::clone(counter);
        Arc::new(move |_: &Event| {
            counter.fetch_add(1, Ordering::SeqCst);
            remove
        })
    }

    fn detached_loop(registry: &Arc<ListenerRegistry>) -> DispatchLoop {
        let (_, events) = crossbeam_channel::bounded(0);
        let (_, shutdown) = crossbeam_channel::bounded(0);
        DispatchLoop::new(
            Arc::clone(registry),
            Arc::new(DispatchStats::new()),
            events,
            shutdown,
        )
    }

    #[test]
    fn test_deliver_invokes_matching_listeners_only() {
        let registry = Arc::new(ListenerRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let misses = Arc::new(AtomicUsize::new(0));
        registry.add_listener("win1", "ready", counting(&hits, false));
        registry.add_listener("win1", "closed", counting(&misses, false));
        registry.add_listener("win2", "ready", counting(&misses, false));

        detached_loop(&registry).deliver(&Event::new("win1", "ready"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(misses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_deliver_removes_listener_returning_true() {
        let registry = Arc::new(ListenerRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));
        registry.add_listener("win1", "ready", counting(&count, true));
        let dispatch_loop = detached_loop(&registry);

        dispatch_loop.deliver(&Event::new("win1", "ready"));
        dispatch_loop.deliver(&Event::new("win1", "ready"));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
        assert_eq!(dispatch_loop.stats.snapshot().self_removals, 1);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_delivery() {
        let registry = Arc::new(ListenerRegistry::new());
        let count = Arc::new(AtomicUsize::new(0));
        registry.add_listener(
            "win1",
            "ready",
            Arc::new(|_: &Event| -> bool { panic!("listener failure") }),
        );
        registry.add_listener("win1", "ready", counting(&count, false));
        let dispatch_loop = detached_loop(&registry);

        dispatch_loop.deliver(&Event::new("win1", "ready"));
        dispatch_loop.deliver(&Event::new("win1", "ready"));

        assert_eq!(count.load(Ordering::SeqCst), 2);
        let stats = dispatch_loop.stats.snapshot();
        assert_eq!(stats.panics, 2);
        assert_eq!(stats.invocations, 4);
        assert_eq!(registry.listener_count("win1", "ready"), 2);
    }

    #[test]
    fn test_panicking_listener_removed_when_configured() {
        let registry = Arc::new(ListenerRegistry::new());
        registry.add_listener(
            "win1",
            "ready",
            Arc::new(|_: &Event| -> bool { panic!("listener failure") }),
        );
        let dispatch_loop = detached_loop(&registry).remove_panicking_listeners(true);

        dispatch_loop.deliver(&Event::new("win1", "ready"));

        assert!(registry.is_empty());
    }

    #[test]
    fn test_listener_may_mutate_registry_during_delivery() {
        let registry = Arc::new(ListenerRegistry::new());
        let late = Arc::new(AtomicUsize::new(0));
        let inner_registry = Arc::clone(&registry);
        let inner_late = Arc::clone(&late);
        registry.add_listener(
            "win1",
            "ready",
            Arc::new(move |_: &Event| {
                inner_registry.add_listener("win1", "ready", counting(&inner_late, false));
                true
            }),
        );
        let dispatch_loop = detached_loop(&registry);

        // The listener added mid-delivery is not part of the current snapshot.
        dispatch_loop.deliver(&Event::new("win1", "ready"));
        assert_eq!(late.load(Ordering::SeqCst), 0);

        dispatch_loop.deliver(&Event::new("win1", "ready"));
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_delivers_in_order_and_stops_on_shutdown() {
        let registry = Arc::new(ListenerRegistry::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.add_listener(
            "win1",
            "tick",
            Arc::new(move |event: &Event| {
                let n = event.payload_value("n").and_then(|v| v.as_u64()).unwrap();
                sink.lock().unwrap().push(n);
                false
            }),
        );

        let (event_tx, event_rx) = crossbeam_channel::bounded(0);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);
        let stats = Arc::new(DispatchStats::new());
        let dispatch_loop = DispatchLoop::new(
            Arc::clone(&registry),
            Arc::clone(&stats),
            event_rx,
            shutdown_rx,
        );
        let handle = thread::spawn(move || dispatch_loop.run());

        for n in 0..5u64 {
            event_tx
                .send(Event::new("win1", "tick").with_payload("n", n))
                .expect("loop should accept events");
        }
        drop(shutdown_tx);
        handle.join().expect("dispatch loop panicked");

        // Rendezvous sends only return once the loop has taken the event, and
        // the loop finishes an event before waiting again.
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(stats.snapshot().events_received, 5);
        assert!(event_tx.send(Event::new("win1", "tick")).is_err());
    }
}
