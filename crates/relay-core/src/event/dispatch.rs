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

//! Execution contexts for [`EventType::Async`](super::EventType::Async) listeners.
//!
//! The emitter hands every async invocation to an [`AsyncDispatcher`] as an
//! [`AsyncJob`] and never looks at it again. A job owns its callback and
//! arguments, so it runs to completion even if the emitter is dropped first.

use super::{EventId, ListenerId};
use crate::config::EmitterConfig;
use crate::error::DispatchError;
use crate::telemetry::EmitterStats;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

/// A detached listener invocation.
pub struct AsyncJob {
    event: EventId,
    listener: ListenerId,
    call: Box<dyn FnOnce() + Send>,
    stats: Arc<EmitterStats>,
}

impl AsyncJob {
    pub(crate) fn new(
        event: EventId,
        listener: ListenerId,
        stats: Arc<EmitterStats>,
        call: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            event,
            listener,
            call: Box::new(call),
            stats,
        }
    }

    /// The event that triggered this job.
    pub fn event(&self) -> EventId {
        self.event
    }

    /// The listener this job invokes.
    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    /// Runs the listener, containing any panic.
    ///
    /// Returns `false` if the listener panicked. The panic is logged and
    /// counted in the emitter's statistics, never propagated.
    pub fn run(self) -> bool {
        let Self {
            event,
            listener,
            call,
            stats,
        } = self;
        match catch_unwind(AssertUnwindSafe(call)) {
            Ok(()) => true,
            Err(payload) => {
                stats.record_async_panic();
                log::error!(
                    "Async listener {listener} for event {event} panicked: {}",
                    panic_message(payload.as_ref())
                );
                false
            }
        }
    }
}

impl fmt::Debug for AsyncJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncJob")
            .field("event", &self.event)
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

/// Launches async listener invocations.
///
/// Implementations must not block the caller waiting for the job, and must
/// run the job through [`AsyncJob::run`] so panics stay contained.
pub trait AsyncDispatcher: Send + Sync + fmt::Debug {
    /// Starts `job` on some other thread of execution.
    fn dispatch(&self, job: AsyncJob) -> Result<(), DispatchError>;
}

/// Runs every job on its own detached OS thread.
#[derive(Debug, Clone)]
pub struct ThreadDispatcher {
    name_prefix: String,
    stack_size: Option<usize>,
}

impl ThreadDispatcher {
    /// Creates a dispatcher using the thread settings from `config`.
    pub fn new(config: &EmitterConfig) -> Self {
        Self {
            name_prefix: config.async_thread_name.clone(),
            stack_size: config.async_stack_size,
        }
    }
}

impl Default for ThreadDispatcher {
    fn default() -> Self {
        Self::new(&EmitterConfig::default())
    }
}

impl AsyncDispatcher for ThreadDispatcher {
    fn dispatch(&self, job: AsyncJob) -> Result<(), DispatchError> {
        let listener = job.listener();
        let mut builder =
            thread::Builder::new().name(format!("{}-{}", self.name_prefix, listener.get()));
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        builder
            .spawn(move || {
                job.run();
            })
            .map(drop)
            .map_err(|e| DispatchError::AsyncSpawn {
                listener,
                reason: e.to_string(),
            })
    }
}

/// Runs jobs on the blocking pool of a `tokio` runtime.
///
/// Useful when the application already owns a runtime and wants async
/// listeners to share its thread budget.
#[derive(Debug, Clone)]
pub struct TokioDispatcher {
    handle: tokio::runtime::Handle,
}

impl TokioDispatcher {
    /// Creates a dispatcher bound to the given runtime.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Binds to the runtime of the calling context, if there is one.
    pub fn current() -> Option<Self> {
        tokio::runtime::Handle::try_current().ok().map(Self::new)
    }
}

impl AsyncDispatcher for TokioDispatcher {
    fn dispatch(&self, job: AsyncJob) -> Result<(), DispatchError> {
        drop(self.handle.spawn_blocking(move || job.run()));
        Ok(())
    }
}
