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

//! Publishes an emitter's health into a [`MetricsRegistry`].

use crate::metrics::MetricsRegistry;
use anyhow::Context;
use relay_core::telemetry::{Metric, MetricId};
use relay_core::EventEmitter;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Namespace used for every emitter metric.
pub const NAMESPACE: &str = "relay";

/// Watches one emitter.
///
/// Each [`publish`](Self::publish) writes the emitter's dispatch counters, the
/// total number of pending thread-local invocations, and one depth gauge per
/// thread with a queue. All metrics carry an `emitter` label with the
/// monitor's name.
#[derive(Debug)]
pub struct EmitterMonitor {
    name: String,
    emitter: Arc<EventEmitter>,
    published_threads: Mutex<HashSet<MetricId>>,
}

impl EmitterMonitor {
    /// Creates a monitor for `emitter`, labelled `name`.
    pub fn new(name: impl Into<String>, emitter: Arc<EventEmitter>) -> Self {
        Self {
            name: name.into(),
            emitter,
            published_threads: Mutex::new(HashSet::new()),
        }
    }

    /// The label this monitor publishes under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the gauge holding the total pending depth.
    pub fn pending_total_id(&self) -> MetricId {
        MetricId::new(NAMESPACE, "pending_total").with_label("emitter", self.name.as_str())
    }

    /// Writes the emitter's current figures into `registry`.
    pub fn publish(&self, registry: &MetricsRegistry) -> anyhow::Result<()> {
        let stats = self.emitter.stats();
        for mut metric in stats.to_metrics(NAMESPACE) {
            metric.id = metric.id.with_label("emitter", self.name.as_str());
            registry
                .record(metric)
                .with_context(|| format!("recording counters for emitter '{}'", self.name))?;
        }

        let depths = self.emitter.pending_depths();
        let total: usize = depths.iter().map(|(_, depth)| depth).sum();
        registry
            .record(Metric::gauge(
                self.pending_total_id(),
                "Thread-local invocations waiting to be processed",
                "invocations",
                total as f64,
            ))
            .with_context(|| format!("recording pending total for emitter '{}'", self.name))?;

        let mut current = HashSet::with_capacity(depths.len());
        for (thread, depth) in depths {
            let id = MetricId::new(NAMESPACE, "pending_depth")
                .with_label("emitter", self.name.as_str())
                .with_label("thread", format!("{thread:?}"));
            registry
                .record(Metric::gauge(
                    id.clone(),
                    "Thread-local invocations waiting on one thread",
                    "invocations",
                    depth as f64,
                ))
                .with_context(|| format!("recording pending depth for {thread:?}"))?;
            current.insert(id);
        }

        let mut published = self
            .published_threads
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for stale in published.difference(&current) {
            // Gone already is fine; the queue was released.
            if registry.remove(stale).is_err() {
                log::trace!("Stale gauge {stale} already removed.");
            }
        }
        *published = current;

        log::trace!(
            "Published emitter '{}': {} emitted, {total} pending.",
            self.name,
            stats.emitted
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::{EventId, EventType};
    use std::sync::Barrier;
    use std::thread;

    fn counter(registry: &MetricsRegistry, name: &str, emitter: &str) -> Option<u64> {
        let id = MetricId::new(NAMESPACE, name).with_label("emitter", emitter);
        registry.get_metric(&id).ok()?.value.as_counter()
    }

    #[test]
    fn test_publish_counters() {
        let emitter = Arc::new(EventEmitter::new());
        emitter.on(EventId(1), EventType::Immediate, |()| {});
        emitter.emit_empty(EventId(1)).unwrap();
        emitter.emit_empty(EventId(1)).unwrap();

        let registry = MetricsRegistry::new();
        let monitor = EmitterMonitor::new("ui", Arc::clone(&emitter));
        monitor.publish(&registry).unwrap();

        assert_eq!(counter(&registry, "emitted", "ui"), Some(2));
        assert_eq!(counter(&registry, "immediate", "ui"), Some(2));
        assert_eq!(counter(&registry, "async_panics", "ui"), Some(0));
    }

    #[test]
    fn test_publish_pending_depths_and_prunes_released_threads() {
        let emitter = Arc::new(EventEmitter::new());
        let step = Arc::new(Barrier::new(2));
        let owner = {
            let emitter = Arc::clone(&emitter);
            let step = Arc::clone(&step);
            thread::spawn(move || {
                emitter.on(EventId(2), EventType::ThreadLocal, |()| {});
                step.wait();
                step.wait();
                emitter.clear_pending()
            })
        };
        step.wait();
        emitter.emit_empty(EventId(2)).unwrap();
        emitter.emit_empty(EventId(2)).unwrap();

        let registry = MetricsRegistry::new();
        let monitor = EmitterMonitor::new("worker", Arc::clone(&emitter));
        monitor.publish(&registry).unwrap();

        let total = registry.get_metric(&monitor.pending_total_id()).unwrap();
        assert_eq!(total.value.as_gauge(), Some(2.0));
        assert_eq!(depth_gauges(&registry), vec![2.0]);

        step.wait();
        assert_eq!(owner.join().unwrap(), 2);
        monitor.publish(&registry).unwrap();

        let total = registry.get_metric(&monitor.pending_total_id()).unwrap();
        assert_eq!(total.value.as_gauge(), Some(0.0));
        assert!(depth_gauges(&registry).is_empty());
        assert_eq!(counter(&registry, "discarded", "worker"), Some(2));
    }

    fn depth_gauges(registry: &MetricsRegistry) -> Vec<f64> {
        registry
            .namespace_metrics(NAMESPACE)
            .into_iter()
            .filter(|m| m.id.name == "pending_depth")
            .filter_map(|m| m.value.as_gauge())
            .collect()
    }
}
