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

//! The [`EventEmitter`].

use super::dispatch::{AsyncDispatcher, AsyncJob, ThreadDispatcher};
use super::pending::{Deferred, PendingQueues};
use super::registry::{Dispatch, Registry};
use super::{EventId, EventType, ListenerId};
use crate::config::EmitterConfig;
use crate::error::DispatchError;
use crate::telemetry::{EmitterStats, StatsSnapshot};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Registers listeners against event ids and delivers emitted events to them.
///
/// All methods take `&self`; share an emitter between threads with `Arc`.
/// Listener callbacks never run while the registry lock is held, so a
/// callback may freely call [`on`](Self::on), [`off`](Self::off) or
/// [`emit`](Self::emit) on the same emitter.
///
/// # Example
///
/// ```rust
/// use relay_core::{EventEmitter, EventId, EventType};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// const SAVED: EventId = EventId(1);
///
/// let emitter = EventEmitter::new();
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
/// emitter.on(SAVED, EventType::ThreadLocal, move |()| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// emitter.emit_empty(SAVED).unwrap();
/// assert_eq!(calls.load(Ordering::SeqCst), 0);
///
/// assert_eq!(emitter.process_events(), 1);
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub struct EventEmitter {
    config: EmitterConfig,
    registry: Mutex<Registry>,
    pending: PendingQueues,
    dispatcher: Arc<dyn AsyncDispatcher>,
    stats: Arc<EmitterStats>,
}

impl EventEmitter {
    /// Creates an emitter with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    /// Creates an emitter whose async listeners run on dedicated threads
    /// configured by `config`.
    pub fn with_config(config: EmitterConfig) -> Self {
        let dispatcher = Arc::new(ThreadDispatcher::new(&config));
        Self::with_dispatcher(config, dispatcher)
    }

    /// Creates an emitter that hands async listeners to `dispatcher`.
    pub fn with_dispatcher(config: EmitterConfig, dispatcher: Arc<dyn AsyncDispatcher>) -> Self {
        log::debug!("EventEmitter initialized with {dispatcher:?}.");
        Self {
            config,
            registry: Mutex::new(Registry::new()),
            pending: PendingQueues::new(),
            dispatcher,
            stats: Arc::new(EmitterStats::default()),
        }
    }

    /// The configuration this emitter was created with.
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Callbacks never run under this lock, so a poisoned guard still
        // holds a consistent registry.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `callback` for `event` and returns its id.
    ///
    /// The calling thread becomes the listener's owner, which matters for
    /// [`EventType::ThreadLocal`]: its invocations run only when this thread
    /// calls [`process_events`](Self::process_events).
    pub fn on<A, F>(&self, event: EventId, mode: EventType, callback: F) -> ListenerId
    where
        A: Clone + Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        self.add_listener(event, mode, false, callback)
    }

    /// Like [`on`](Self::on), but the listener removes itself the first time
    /// an emission selects it.
    pub fn once<A, F>(&self, event: EventId, mode: EventType, callback: F) -> ListenerId
    where
        A: Clone + Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        self.add_listener(event, mode, true, callback)
    }

    fn add_listener<A, F>(&self, event: EventId, mode: EventType, once: bool, callback: F) -> ListenerId
    where
        A: Clone + Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        let owner = thread::current().id();
        let id = self
            .registry()
            .insert::<A>(event, mode, owner, once, Arc::new(callback));
        log::trace!("Registered {mode} listener {id} on event {event} (once: {once}).");
        id
    }

    /// Removes a listener.
    ///
    /// Queued thread-local invocations of the listener are discarded when
    /// their thread drains. Returns `false`, and does nothing, if the id is
    /// unknown or was already removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let removed = self.registry().remove(id);
        if removed {
            log::trace!("Removed listener {id}.");
        }
        removed
    }

    /// Removes every listener of `event`, returning how many were removed.
    pub fn off_all(&self, event: EventId) -> usize {
        self.registry().remove_event(event)
    }

    /// Emits `event` with `args` to every listener currently registered for it.
    ///
    /// Immediate listeners run on this thread, in registration order, before
    /// `emit` returns; a panic in one of them propagates to the caller and
    /// skips the rest. Thread-local listeners are queued for their owner
    /// thread. Async listeners are launched and not waited for.
    ///
    /// # Errors
    ///
    /// [`DispatchError::SignatureMismatch`] if any listener of `event` was
    /// registered with an argument type other than `A`; no listener runs.
    /// [`DispatchError::AsyncSpawn`] if an async listener could not be
    /// launched; all other listeners were still dispatched.
    pub fn emit<A>(&self, event: EventId, args: A) -> Result<(), DispatchError>
    where
        A: Clone + Send + 'static,
    {
        let claimed = self.registry().claim::<A>(event);
        let dispatches = claimed.inspect_err(|e| {
            self.stats.record_mismatch();
            log::error!("Rejected emit: {e}");
        })?;
        self.stats.record_emit();
        log::trace!("Emitting event {event} to {} listener(s).", dispatches.len());

        let mut launch_error = None;
        for dispatch in dispatches {
            match dispatch.mode {
                EventType::Immediate => {
                    self.stats.record_immediate();
                    (dispatch.callback)(args.clone());
                }
                EventType::ThreadLocal => self.defer(dispatch, args.clone()),
                EventType::Async => {
                    if let Err(e) = self.launch(event, dispatch, args.clone()) {
                        log::error!("{e}");
                        launch_error.get_or_insert(e);
                    }
                }
            }
        }

        match launch_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Emits an event that carries no arguments.
    pub fn emit_empty(&self, event: EventId) -> Result<(), DispatchError> {
        self.emit(event, ())
    }

    fn defer<A: Send + 'static>(&self, dispatch: Dispatch<A>, args: A) {
        let Dispatch {
            id,
            owner,
            once,
            active,
            callback,
            ..
        } = dispatch;
        let pushed = self
            .pending
            .push(owner, Deferred::new(id, once, active, move || callback(args)));
        self.record_push(owner, pushed);
    }

    fn record_push(&self, owner: ThreadId, pushed: Option<usize>) {
        let Some(depth) = pushed else {
            self.stats.record_discarded(1);
            return;
        };
        self.stats.record_deferred();

        let threshold = self.config.pending_warn_threshold;
        if threshold > 0 && depth > 0 && depth % threshold == 0 {
            log::warn!(
                "{depth} invocations pending for {owner:?}; is that thread calling process_events?"
            );
        }
    }

    fn launch<A: Send + 'static>(
        &self,
        event: EventId,
        dispatch: Dispatch<A>,
        args: A,
    ) -> Result<(), DispatchError> {
        let callback = dispatch.callback;
        let job = AsyncJob::new(event, dispatch.id, Arc::clone(&self.stats), move || {
            callback(args)
        });
        self.dispatcher.dispatch(job)?;
        self.stats.record_async_launch();
        Ok(())
    }

    /// Runs the thread-local invocations queued for the calling thread.
    ///
    /// Only the invocations already queued when the call starts are run, in
    /// the order they were queued; anything queued meanwhile waits for the
    /// next call. Never blocks waiting for work. Returns the number run.
    ///
    /// If an invocation panics, the panic propagates and the invocations
    /// behind it stay queued.
    pub fn process_events(&self) -> usize {
        let owner = thread::current().id();
        let Some(queue) = self.pending.receiver(owner) else {
            return 0;
        };

        let mut ran = 0;
        for _ in 0..queue.len() {
            let Ok(item) = queue.try_recv() else {
                break;
            };
            if item.once {
                self.registry().settle(item.listener);
            }
            if !item.is_live() {
                self.stats.record_discarded(1);
                log::trace!("Discarded queued invocation of removed listener {}.", item.listener);
                continue;
            }
            item.run();
            self.stats.record_drained();
            ran += 1;
        }

        if ran > 0 {
            log::debug!("Processed {ran} pending invocation(s) on {owner:?}.");
        }
        ran
    }

    /// Drops the calling thread's pending queue without running it.
    ///
    /// Threads that stop draining should call this before exiting. Returns
    /// the number of invocations dropped.
    pub fn clear_pending(&self) -> usize {
        let dropped = self.pending.release(thread::current().id());
        if dropped.is_empty() {
            return 0;
        }

        if dropped.iter().any(|item| item.once) {
            let mut registry = self.registry();
            for item in dropped.iter().filter(|item| item.once) {
                registry.settle(item.listener);
            }
        }
        self.stats.record_discarded(dropped.len() as u64);
        log::debug!("Dropped {} pending invocation(s).", dropped.len());
        dropped.len()
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: EventId) -> usize {
        self.registry().listener_count(event)
    }

    /// Whether `event` has at least one listener.
    pub fn has_listeners(&self, event: EventId) -> bool {
        self.listener_count(event) > 0
    }

    /// Events that currently have at least one listener, in ascending order.
    pub fn event_ids(&self) -> Vec<EventId> {
        self.registry().event_ids()
    }

    /// Number of invocations queued for the calling thread.
    pub fn pending_count(&self) -> usize {
        self.pending.depth(thread::current().id())
    }

    /// Queue depth for every thread that has ever had an invocation queued.
    pub fn pending_depths(&self) -> Vec<(ThreadId, usize)> {
        self.pending.depths()
    }

    /// A copy of the emitter's dispatch counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry();
        f.debug_struct("EventEmitter")
            .field("events", &registry.event_ids().len())
            .field("listeners", &registry.total_listeners())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
