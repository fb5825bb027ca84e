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

//! # Courier Dispatch
//!
//! A single-process event dispatcher. Listeners are registered per
//! `(target, event name)` pair in a [`ListenerRegistry`]; events submitted to a
//! [`Dispatcher`] are handed to one worker thread that delivers them in order,
//! one event at a time.
//!
//! ```rust,no_run
//! use courier_core::Event;
//! use courier_dispatch::Dispatcher;
//!
//! let dispatcher = Dispatcher::default();
//! dispatcher.add_listener("win1", "ready", |event| {
//!     println!("{event} is ready");
//!     true
//! });
//! dispatcher.start().expect("dispatch thread should spawn");
//! dispatcher.dispatch(Event::new("win1", "ready"));
//! dispatcher.close();
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod service;
pub mod stats;

pub use config::DispatcherConfig;
pub use dispatcher::{Dispatcher, LifecycleState, TargetListeners};
pub use error::{DispatchError, DispatchResult};
pub use registry::{ListenerKey, ListenerRegistry};
pub use stats::{DispatchStats, StatsSnapshot};
