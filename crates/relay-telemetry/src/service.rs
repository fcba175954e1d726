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

//! Service that keeps emitter metrics fresh.

use crate::metrics::MetricsRegistry;
use crate::monitor::EmitterMonitor;
use std::time::{Duration, Instant};

/// Owns a [`MetricsRegistry`] and the monitors that feed it.
#[derive(Debug)]
pub struct TelemetryService {
    metrics: MetricsRegistry,
    monitors: Vec<EmitterMonitor>,
    last_update: Option<Instant>,
    update_interval: Duration,
}

impl TelemetryService {
    /// Creates a service that publishes at most once per `update_interval`.
    pub fn new(update_interval: Duration) -> Self {
        Self {
            metrics: MetricsRegistry::new(),
            monitors: Vec::new(),
            last_update: None,
            update_interval,
        }
    }

    /// Adds a monitor; it is published on the next due tick.
    pub fn add_monitor(&mut self, monitor: EmitterMonitor) {
        log::debug!("Monitoring emitter '{}'.", monitor.name());
        self.monitors.push(monitor);
    }

    /// Should be called periodically (e.g. once per loop iteration).
    /// Publishes every monitor if the interval has elapsed since the last
    /// publish, and reports whether it did.
    pub fn tick(&mut self) -> bool {
        let due = match self.last_update {
            Some(last) => last.elapsed() >= self.update_interval,
            None => true,
        };
        if !due {
            return false;
        }
        self.publish_all();
        true
    }

    /// Publishes every monitor now, regardless of the interval.
    ///
    /// A failing monitor is logged and does not stop the others.
    pub fn publish_all(&mut self) {
        log::trace!("Publishing {} emitter monitor(s)...", self.monitors.len());
        for monitor in &self.monitors {
            if let Err(e) = monitor.publish(&self.metrics) {
                log::warn!("Telemetry publish failed: {e:#}");
            }
        }
        self.last_update = Some(Instant::now());
    }

    /// Returns a reference to the metrics registry.
    pub fn metrics_registry(&self) -> &MetricsRegistry {
        &self.metrics
    }
}

impl Default for TelemetryService {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
