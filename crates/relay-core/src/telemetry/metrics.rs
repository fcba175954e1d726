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

//! Metric identifiers and values.

use std::fmt;
use std::time::Instant;

/// A structured metric identifier: namespace, name and sorted labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricId {
    /// The broad category of the metric (e.g. "relay").
    pub namespace: String,
    /// The specific name of the metric (e.g. "pending_depth").
    pub name: String,
    /// Key-value labels, kept sorted by key.
    pub labels: Vec<(String, String)>,
}

impl MetricId {
    /// Creates an unlabelled metric id.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            labels: Vec::new(),
        }
    }

    /// Adds a label, keeping labels sorted by key.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self.labels.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)?;
        if !self.labels.is_empty() {
            let labels = self
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "[{labels}]")?;
        }
        Ok(())
    }
}

/// The kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// Monotonically increasing total.
    Counter,
    /// A value that can go up or down.
    Gauge,
}

/// The current value of a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// A running total.
    Counter(u64),
    /// An instantaneous reading.
    Gauge(f64),
}

impl MetricValue {
    /// The [`MetricType`] of this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
        }
    }

    /// The value as a counter, if it is one.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            MetricValue::Counter(v) => Some(*v),
            MetricValue::Gauge(_) => None,
        }
    }

    /// The value as a gauge, if it is one.
    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            MetricValue::Gauge(v) => Some(*v),
            MetricValue::Counter(_) => None,
        }
    }
}

/// A metric value together with its description.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric's identifier.
    pub id: MetricId,
    /// Human-readable description.
    pub description: String,
    /// Unit of measurement ("count" for counters).
    pub unit: String,
    /// Current value.
    pub value: MetricValue,
    /// When the value last changed.
    pub updated_at: Instant,
}

impl Metric {
    /// Creates a counter metric.
    pub fn counter(id: MetricId, description: impl Into<String>, value: u64) -> Self {
        Self {
            id,
            description: description.into(),
            unit: "count".to_string(),
            value: MetricValue::Counter(value),
            updated_at: Instant::now(),
        }
    }

    /// Creates a gauge metric.
    pub fn gauge(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            unit: unit.into(),
            value: MetricValue::Gauge(value),
            updated_at: Instant::now(),
        }
    }

    /// The [`MetricType`] of this metric.
    pub fn metric_type(&self) -> MetricType {
        self.value.metric_type()
    }
}

/// Result alias for metric storage operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error raised by metric storage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    /// No metric with this id is stored.
    #[error("metric not found: {0}")]
    MetricNotFound(MetricId),
    /// The operation expected a different kind of metric.
    #[error("metric type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// The type the operation needed.
        expected: MetricType,
        /// The type actually stored.
        found: MetricType,
    },
    /// The storage backend failed.
    #[error("metrics storage error: {0}")]
    StorageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_sorted_in_display() {
        let id = MetricId::new("relay", "pending_depth")
            .with_label("thread", "main")
            .with_label("emitter", "ui");
        assert_eq!(id.to_string(), "relay:pending_depth[emitter=ui,thread=main]");
        assert_eq!(MetricId::new("relay", "emitted").to_string(), "relay:emitted");
    }

    #[test]
    fn test_value_accessors() {
        let counter = Metric::counter(MetricId::new("a", "b"), "c", 3);
        assert_eq!(counter.metric_type(), MetricType::Counter);
        assert_eq!(counter.value.as_counter(), Some(3));
        assert_eq!(counter.value.as_gauge(), None);

        let gauge = Metric::gauge(MetricId::new("a", "g"), "g", "items", 1.5);
        assert_eq!(gauge.value.as_gauge(), Some(1.5));
        assert_eq!(gauge.unit, "items");
    }
}
