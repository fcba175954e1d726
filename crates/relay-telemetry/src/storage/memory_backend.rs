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

//! In-memory metrics backend.

use super::backend::MetricsBackend;
use relay_core::telemetry::{Metric, MetricId, MetricsError, MetricsResult};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Metrics kept in a `RwLock<HashMap>`: concurrent reads, exclusive writes.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    storage: RwLock<HashMap<MetricId, Metric>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> MetricsResult<RwLockReadGuard<'_, HashMap<MetricId, Metric>>> {
        self.storage
            .read()
            .map_err(|_| MetricsError::StorageError("Failed to acquire read lock".to_string()))
    }

    fn write(&self) -> MetricsResult<RwLockWriteGuard<'_, HashMap<MetricId, Metric>>> {
        self.storage
            .write()
            .map_err(|_| MetricsError::StorageError("Failed to acquire write lock".to_string()))
    }

    /// Copies of every metric in `namespace`.
    pub fn metrics_by_namespace(&self, namespace: &str) -> Vec<Metric> {
        self.read()
            .map(|storage| {
                storage
                    .values()
                    .filter(|metric| metric.id.namespace == namespace)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl MetricsBackend for InMemoryBackend {
    fn put_metric(&self, metric: Metric) -> MetricsResult<()> {
        self.write()?.insert(metric.id.clone(), metric);
        Ok(())
    }

    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn contains_metric(&self, id: &MetricId) -> bool {
        self.read().is_ok_and(|storage| storage.contains_key(id))
    }

    fn remove_metric(&self, id: &MetricId) -> MetricsResult<()> {
        self.write()?
            .remove(id)
            .map(drop)
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn list_all_metrics(&self) -> Vec<Metric> {
        self.read()
            .map(|storage| storage.values().cloned().collect())
            .unwrap_or_default()
    }

    fn clear_all(&self) -> MetricsResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn metric_count(&self) -> usize {
        self.read().map_or(0, |storage| storage.len())
    }
}
