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

//! Type-erased listener records.
//!
//! Listeners for different events may take different argument types, yet they
//! all live in one registry. A record keeps the signature-agnostic metadata in
//! plain fields and the callback itself behind `dyn Any`, holding the exact
//! `Arc<dyn Fn(A)>` it was registered with. Dispatch recovers the typed
//! callback through a checked downcast.

use super::{EventType, ListenerId};
use std::any::{type_name, Any};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;

/// A shared, typed listener callback. `A` is the full argument list.
pub(crate) type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

/// One registered listener.
pub(crate) struct ListenerRecord {
    pub(crate) id: ListenerId,
    pub(crate) mode: EventType,
    pub(crate) owner: ThreadId,
    pub(crate) once: bool,
    /// Cleared when the listener is removed; queued invocations check it.
    pub(crate) active: Arc<AtomicBool>,
    signature: &'static str,
    callback: Box<dyn Any + Send + Sync>,
}

impl ListenerRecord {
    pub(crate) fn new<A: 'static>(
        id: ListenerId,
        mode: EventType,
        owner: ThreadId,
        once: bool,
        callback: Callback<A>,
    ) -> Self {
        Self {
            id,
            mode,
            owner,
            once,
            active: Arc::new(AtomicBool::new(true)),
            signature: type_name::<A>(),
            callback: Box::new(callback),
        }
    }

    /// The argument type this listener was registered with.
    pub(crate) fn signature(&self) -> &'static str {
        self.signature
    }

    /// Recovers the typed callback, or `None` if `A` is not the registered
    /// argument type.
    pub(crate) fn typed<A: 'static>(&self) -> Option<Callback<A>> {
        self.callback.downcast_ref::<Callback<A>>().cloned()
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for ListenerRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRecord")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("owner", &self.owner)
            .field("once", &self.once)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
