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

//! # Relay Core
//!
//! A cross-thread event emitter. Listeners are registered against opaque
//! [`EventId`]s and delivered in one of three ways, chosen per listener:
//!
//! - [`EventType::Immediate`]: called synchronously by [`EventEmitter::emit`].
//! - [`EventType::ThreadLocal`]: queued for the thread that registered the
//!   listener and run when that thread calls [`EventEmitter::process_events`].
//! - [`EventType::Async`]: launched on a separate thread and never awaited.
//!
//! ```rust
//! use relay_core::{EventEmitter, EventId, EventType};
//! use std::sync::atomic::{AtomicI32, Ordering};
//! use std::sync::Arc;
//!
//! let emitter = EventEmitter::new();
//! let seen = Arc::new(AtomicI32::new(0));
//! let sink = Arc::clone(&seen);
//! emitter.on(EventId(42), EventType::Immediate, move |(value,): (i32,)| {
//!     sink.store(value, Ordering::SeqCst);
//! });
//!
//! emitter.emit(EventId(42), (7,)).unwrap();
//! assert_eq!(seen.load(Ordering::SeqCst), 7);
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod telemetry;

pub use config::EmitterConfig;
pub use error::{ConfigError, DispatchError};
pub use event::{
    AsyncDispatcher, AsyncJob, EventEmitter, EventId, EventType, ListenerId, ThreadDispatcher,
    TokioDispatcher,
};
