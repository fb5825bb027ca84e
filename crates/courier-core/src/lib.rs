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

//! # Courier Core
//!
//! Vocabulary shared between the dispatcher and its collaborators: the
//! [`Event`] value that flows through a dispatcher, the [`Listener`] callback
//! type with its [`ListenerId`] handle, and the [`Listenable`] contract for
//! components that accept listeners scoped to their own target.

#![warn(missing_docs)]

pub mod event;
pub mod listener;

pub use event::Event;
pub use listener::{Listenable, Listener, ListenerId};
