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

//! # Relay Telemetry
//!
//! Stores emitter metrics and publishes them on a schedule.
//!
//! - [`storage`]: the [`MetricsBackend`](storage::MetricsBackend) contract and
//!   an in-memory implementation.
//! - [`metrics`]: the [`MetricsRegistry`](metrics::MetricsRegistry) facade with
//!   typed counter and gauge handles.
//! - [`monitor`]: [`EmitterMonitor`](monitor::EmitterMonitor), which turns an
//!   emitter's statistics and queue depths into metrics.
//! - [`service`]: [`TelemetryService`](service::TelemetryService), which ticks
//!   every monitor on an interval.

#![warn(missing_docs)]

pub mod metrics;
pub mod monitor;
pub mod service;
pub mod storage;

pub use metrics::MetricsRegistry;
pub use monitor::EmitterMonitor;
pub use service::TelemetryService;
