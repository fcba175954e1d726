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

// Relay Sandbox
// A worker thread owns thread-local listeners and drains them in a loop
// while the main thread emits events in all three delivery modes.

use anyhow::{Context, Result};
use relay_core::telemetry::MetricId;
use relay_core::{EmitterConfig, EventEmitter, EventId, EventType};
use relay_telemetry::{EmitterMonitor, TelemetryService};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const FRAME: EventId = EventId(1);
const RESIZED: EventId = EventId(2);
const SAVE_REQUESTED: EventId = EventId(3);
const SHUTDOWN: EventId = EventId(4);

fn load_config() -> Result<EmitterConfig> {
    match std::env::args().nth(1) {
        Some(path) => EmitterConfig::from_file(&path)
            .with_context(|| format!("loading emitter config from '{path}'")),
        None => Ok(EmitterConfig::default()),
    }
}

fn spawn_worker(emitter: Arc<EventEmitter>, ready: Arc<Barrier>) -> thread::JoinHandle<usize> {
    thread::spawn(move || {
        let running = Arc::new(AtomicBool::new(true));

        emitter.on(RESIZED, EventType::ThreadLocal, |(width, height): (u32, u32)| {
            log::info!(
                "[{:?}] resize to {width}x{height}",
                thread::current().name().unwrap_or("worker")
            );
        });
        let flag = Arc::clone(&running);
        emitter.once(SHUTDOWN, EventType::ThreadLocal, move |()| {
            log::info!("Worker received shutdown.");
            flag.store(false, Ordering::SeqCst);
        });
        ready.wait();

        let mut processed = 0;
        while running.load(Ordering::SeqCst) {
            processed += emitter.process_events();
            thread::sleep(Duration::from_millis(5));
        }
        processed
    })
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let emitter = Arc::new(EventEmitter::with_config(config));
    let mut telemetry = TelemetryService::new(Duration::from_millis(50));
    telemetry.add_monitor(EmitterMonitor::new("sandbox", Arc::clone(&emitter)));

    emitter.on(FRAME, EventType::Immediate, |(frame,): (u64,)| {
        log::debug!("frame {frame}");
    });
    emitter.on(SAVE_REQUESTED, EventType::Async, |(path,): (String,)| {
        thread::sleep(Duration::from_millis(20));
        log::info!("Saved '{path}' in the background.");
    });

    let ready = Arc::new(Barrier::new(2));
    let worker = spawn_worker(Arc::clone(&emitter), Arc::clone(&ready));
    ready.wait();

    for frame in 0..10u64 {
        emitter.emit(FRAME, (frame,))?;
        if frame % 4 == 0 {
            emitter.emit(RESIZED, (800 + frame as u32, 600u32))?;
        }
        if frame == 5 {
            emitter.emit(SAVE_REQUESTED, ("scene.ron".to_string(),))?;
        }
        telemetry.tick();
        thread::sleep(Duration::from_millis(10));
    }

    // A mismatched payload is reported, not dispatched.
    if let Err(e) = emitter.emit(RESIZED, (1024u32,)) {
        log::warn!("{e}");
    }

    emitter.emit_empty(SHUTDOWN)?;
    let processed = worker
        .join()
        .map_err(|_| anyhow::anyhow!("worker thread panicked"))?;
    log::info!("Worker processed {processed} thread-local invocation(s).");

    // Let the background save finish before the final report.
    thread::sleep(Duration::from_millis(50));
    telemetry.publish_all();
    let registry = telemetry.metrics_registry();
    let names = [
        "emitted",
        "immediate",
        "deferred",
        "drained",
        "async_launched",
        "signature_mismatches",
    ];
    for name in names {
        let id = MetricId::new("relay", name).with_label("emitter", "sandbox");
        let value = registry.get_metric(&id)?.value.as_counter().unwrap_or(0);
        log::info!("{id} = {value}");
    }
    Ok(())
}
