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

//! Per-thread queues of deferred (thread-local) invocations.
//!
//! Each owning thread gets an unbounded `flume` channel. Any thread may push
//! into it; only the owner drains it. The map from thread to channel has its
//! own lock, separate from the listener registry.

use super::ListenerId;
use flume::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::ThreadId;

/// A listener invocation bound to its arguments, waiting for its thread.
pub(crate) struct Deferred {
    pub(crate) listener: ListenerId,
    pub(crate) once: bool,
    active: Arc<AtomicBool>,
    call: Box<dyn FnOnce() + Send>,
}

impl Deferred {
    pub(crate) fn new(
        listener: ListenerId,
        once: bool,
        active: Arc<AtomicBool>,
        call: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            listener,
            once,
            active,
            call: Box::new(call),
        }
    }

    /// `false` once the listener has been removed with `off`.
    pub(crate) fn is_live(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn run(self) {
        (self.call)()
    }
}

struct ThreadQueue {
    sender: Sender<Deferred>,
    receiver: Receiver<Deferred>,
}

impl ThreadQueue {
    fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }
}

#[derive(Default)]
pub(crate) struct PendingQueues {
    queues: Mutex<HashMap<ThreadId, ThreadQueue>>,
}

impl PendingQueues {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn queues(&self) -> MutexGuard<'_, HashMap<ThreadId, ThreadQueue>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues `item` for `owner` and returns the queue depth afterwards, or
    /// `None` if the item was dropped.
    pub(crate) fn push(&self, owner: ThreadId, item: Deferred) -> Option<usize> {
        let sender = self
            .queues()
            .entry(owner)
            .or_insert_with(ThreadQueue::new)
            .sender
            .clone();

        let listener = item.listener;
        if let Err(e) = sender.send(item) {
            // The receiver lives in the map next to the sender, so this only
            // happens if the queue was released concurrently.
            log::error!("Dropped invocation of listener {listener} for {owner:?}: {e}");
            return None;
        }
        Some(sender.len())
    }

    /// The receiving end of `owner`'s queue, if anything was ever queued for it.
    pub(crate) fn receiver(&self, owner: ThreadId) -> Option<Receiver<Deferred>> {
        self.queues()
            .get(&owner)
            .map(|queue| queue.receiver.clone())
    }

    /// Detaches `owner`'s queue and hands back everything still in it.
    pub(crate) fn release(&self, owner: ThreadId) -> Vec<Deferred> {
        let queue = self.queues().remove(&owner);
        queue.map_or_else(Vec::new, |queue| queue.receiver.drain().collect())
    }

    pub(crate) fn depth(&self, owner: ThreadId) -> usize {
        self.queues()
            .get(&owner)
            .map_or(0, |queue| queue.receiver.len())
    }

    pub(crate) fn depths(&self) -> Vec<(ThreadId, usize)> {
        self.queues()
            .iter()
            .map(|(owner, queue)| (*owner, queue.receiver.len()))
            .collect()
    }
}
