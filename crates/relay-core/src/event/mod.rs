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

//! Event identifiers, listener storage and the [`EventEmitter`].
//!
//! Listener callbacks take their whole argument list as one value `A`: a
//! tuple such as `(i32, String)` for several arguments, `(i32,)` for one and
//! `()` for none. Every listener of one event must use the same `A`, and
//! [`EventEmitter::emit`] must be called with it.

mod dispatch;
mod emitter;
mod id;
mod listener;
mod mode;
mod pending;
mod registry;

pub use self::dispatch::{AsyncDispatcher, AsyncJob, ThreadDispatcher, TokioDispatcher};
pub use self::emitter::EventEmitter;
pub use self::id::{EventId, ListenerId};
pub use self::mode::EventType;
