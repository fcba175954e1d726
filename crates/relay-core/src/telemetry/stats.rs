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

//! Live dispatch counters kept by every emitter.

use super::metrics::{Metric, MetricId};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters updated on the dispatch paths.
///
/// Shared with async jobs so panics can be counted after the emitting call
/// has returned.
#[derive(Debug, Default)]
pub struct EmitterStats {
    emitted: AtomicU64,
    immediate: AtomicU64,
    deferred: AtomicU64,
    drained: AtomicU64,
    discarded: AtomicU64,
    async_launched: AtomicU64,
    async_panics: AtomicU64,
    signature_mismatches: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl EmitterStats {
    pub(crate) fn record_emit(&self) {
        bump(&self.emitted);
    }

    pub(crate) fn record_immediate(&self) {
        bump(&self.immediate);
    }

    pub(crate) fn record_deferred(&self) {
        bump(&self.deferred);
    }

    pub(crate) fn record_drained(&self) {
        bump(&self.drained);
    }

    pub(crate) fn record_discarded(&self, count: u64) {
        self.discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_async_launch(&self) {
        bump(&self.async_launched);
    }

    pub(crate) fn record_async_panic(&self) {
        bump(&self.async_panics);
    }

    pub(crate) fn record_mismatch(&self) {
        bump(&self.signature_mismatches);
    }

    /// Reads all counters. Individual fields are consistent; the set is not
    /// an atomic snapshot.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            emitted: self.emitted.load(Ordering::Relaxed),
            immediate: self.immediate.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            async_launched: self.async_launched.load(Ordering::Relaxed),
            async_panics: self.async_panics.load(Ordering::Relaxed),
            signature_mismatches: self.signature_mismatches.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`EmitterStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Successful `emit` calls.
    pub emitted: u64,
    /// Immediate listener invocations started.
    pub immediate: u64,
    /// Thread-local invocations queued.
    pub deferred: u64,
    /// Thread-local invocations run by `process_events`.
    pub drained: u64,
    /// Queued invocations dropped because their listener was removed or
    /// their queue was released.
    pub discarded: u64,
    /// Async invocations handed to the dispatcher.
    pub async_launched: u64,
    /// Async invocations that panicked.
    pub async_panics: u64,
    /// `emit` calls rejected for a signature mismatch.
    pub signature_mismatches: u64,
}

impl StatsSnapshot {
    /// Converts the snapshot into counter metrics under `namespace`.
    pub fn to_metrics(&self, namespace: &str) -> Vec<Metric> {
        [
            ("emitted", "Successful emit calls", self.emitted),
            ("immediate", "Immediate listener invocations", self.immediate),
            ("deferred", "Thread-local invocations queued", self.deferred),
            ("drained", "Thread-local invocations run", self.drained),
            ("discarded", "Queued invocations dropped", self.discarded),
            ("async_launched", "Async invocations launched", self.async_launched),
            ("async_panics", "Async invocations that panicked", self.async_panics),
            (
                "signature_mismatches",
                "Emits rejected for a signature mismatch",
                self.signature_mismatches,
            ),
        ]
        .into_iter()
        .map(|(name, description, value)| {
            Metric::counter(MetricId::new(namespace, name), description, value)
        })
        .collect()
    }
}
