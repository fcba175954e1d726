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

//! Cross-thread delivery tests for the three dispatch modes.

use relay_core::{EmitterConfig, EventEmitter, EventId, EventType, TokioDispatcher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

#[test]
fn test_immediate_and_async_on_same_event() {
    let emitter = EventEmitter::new();
    let immediate_seen = Arc::new(Mutex::new(Vec::new()));
    let (async_tx, async_rx) = flume::unbounded();
    let release = Arc::new(Barrier::new(2));

    let seen = Arc::clone(&immediate_seen);
    emitter.on(EventId(42), EventType::Immediate, move |(value,): (i32,)| {
        seen.lock().unwrap().push(value);
    });
    let gate = Arc::clone(&release);
    emitter.on(EventId(42), EventType::Async, move |(value,): (i32,)| {
        gate.wait();
        async_tx.send(value).unwrap();
    });

    emitter.emit(EventId(42), (7,)).unwrap();

    // `emit` returned while the async listener is still parked on the barrier.
    assert_eq!(*immediate_seen.lock().unwrap(), vec![7]);
    assert!(async_rx.try_recv().is_err());

    release.wait();
    assert_eq!(async_rx.recv_timeout(TIMEOUT).unwrap(), 7);
}

#[test]
fn test_once_immediate_counts_one() {
    let emitter = EventEmitter::new();
    let count = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&count);
    emitter.once(EventId(1), EventType::Immediate, move |()| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    emitter.emit_empty(EventId(1)).unwrap();
    emitter.emit_empty(EventId(1)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_thread_local_runs_on_owner_after_drain() {
    let emitter = Arc::new(EventEmitter::new());
    let count = Arc::new(AtomicUsize::new(0));
    let ran_on = Arc::new(Mutex::new(None));

    let (registered_tx, registered_rx) = flume::bounded(1);
    let (emitted_tx, emitted_rx) = flume::bounded::<()>(1);
    let (checked_tx, checked_rx) = flume::bounded::<()>(1);

    let owner = {
        let emitter = Arc::clone(&emitter);
        let count = Arc::clone(&count);
        let ran_on = Arc::clone(&ran_on);
        thread::spawn(move || {
            emitter.on(EventId(4), EventType::ThreadLocal, move |()| {
                count.fetch_add(1, Ordering::SeqCst);
                *ran_on.lock().unwrap() = Some(thread::current().id());
            });
            registered_tx.send(()).unwrap();

            emitted_rx.recv_timeout(TIMEOUT).unwrap();
            checked_rx.recv_timeout(TIMEOUT).unwrap();
            let processed = emitter.process_events();
            (thread::current().id(), processed)
        })
    };

    registered_rx.recv_timeout(TIMEOUT).unwrap();
    emitter.emit_empty(EventId(4)).unwrap();
    emitted_tx.send(()).unwrap();

    // Nothing ran on the emitting thread, nor anywhere else yet.
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(emitter.process_events(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
    checked_tx.send(()).unwrap();

    let (owner_id, processed) = owner.join().unwrap();
    assert_eq!(processed, 1);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(*ran_on.lock().unwrap(), Some(owner_id));
}

#[test]
fn test_pending_depth_is_observable_from_other_threads() {
    let emitter = Arc::new(EventEmitter::new());
    let owner = {
        let emitter = Arc::clone(&emitter);
        thread::spawn(move || {
            emitter.on(EventId(5), EventType::ThreadLocal, |()| {});
            thread::current().id()
        })
        .join()
        .unwrap()
    };

    for _ in 0..3 {
        emitter.emit_empty(EventId(5)).unwrap();
    }
    assert_eq!(emitter.pending_depths(), vec![(owner, 3)]);
    assert_eq!(emitter.pending_count(), 0);
}

#[test]
fn test_once_fires_at_most_once_under_contention() {
    let emitter = Arc::new(EventEmitter::new());
    let count = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&count);
    emitter.once(EventId(8), EventType::Immediate, move |()| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    let start = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let emitter = Arc::clone(&emitter);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for _ in 0..50 {
                    emitter.emit_empty(EventId(8)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_registration_yields_unique_ids() {
    let emitter = Arc::new(EventEmitter::new());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let emitter = Arc::clone(&emitter);
            thread::spawn(move || {
                (0..100)
                    .map(|_| emitter.on(EventId(t), EventType::Immediate, |()| {}))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<_> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 400);
    assert_eq!(emitter.event_ids().len(), 4);
}

#[test]
fn test_emitters_are_independent() {
    let first = EventEmitter::new();
    let second = EventEmitter::new();
    let count = Arc::new(AtomicUsize::new(0));

    let sink = Arc::clone(&count);
    let id = first.on(EventId(1), EventType::Immediate, move |()| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    second.emit_empty(EventId(1)).unwrap();
    assert!(!second.off(id));
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert!(!second.has_listeners(EventId(1)));

    first.emit_empty(EventId(1)).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_off_silences_every_mode() {
    let emitter = EventEmitter::new();
    let count = Arc::new(AtomicUsize::new(0));
    let ids: Vec<_> = [EventType::Immediate, EventType::ThreadLocal, EventType::Async]
        .into_iter()
        .map(|mode| {
            let sink = Arc::clone(&count);
            emitter.on(EventId(3), mode, move |()| {
                sink.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    for id in ids {
        assert!(emitter.off(id));
    }
    emitter.emit_empty(EventId(3)).unwrap();
    emitter.process_events();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_async_panic_is_contained() {
    let emitter = EventEmitter::new();
    let (done_tx, done_rx) = flume::bounded(1);
    emitter.on(EventId(9), EventType::Async, |()| panic!("async failure"));
    emitter.on(EventId(9), EventType::Async, move |()| {
        done_tx.send(()).unwrap();
    });

    emitter.emit_empty(EventId(9)).unwrap();
    done_rx.recv_timeout(TIMEOUT).unwrap();

    let deadline = std::time::Instant::now() + TIMEOUT;
    while emitter.stats().async_panics == 0 && std::time::Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(emitter.stats().async_panics, 1);
    assert_eq!(emitter.stats().async_launched, 2);
}

#[test]
fn test_async_job_outlives_emitter() {
    let emitter = EventEmitter::new();
    let gate = Arc::new(Barrier::new(2));
    let (done_tx, done_rx) = flume::bounded(1);

    let wait = Arc::clone(&gate);
    emitter.on(EventId(2), EventType::Async, move |(text,): (String,)| {
        wait.wait();
        done_tx.send(text.len()).unwrap();
    });
    emitter.emit(EventId(2), ("payload".to_string(),)).unwrap();
    drop(emitter);

    gate.wait();
    assert_eq!(done_rx.recv_timeout(TIMEOUT).unwrap(), 7);
}

#[test]
fn test_tokio_dispatcher_delivers_async_listeners() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let dispatcher = Arc::new(TokioDispatcher::new(runtime.handle().clone()));
    let emitter = EventEmitter::with_dispatcher(EmitterConfig::default(), dispatcher);
    let (tx, rx) = flume::bounded(1);
    emitter.on(EventId(6), EventType::Async, move |(a, b): (u8, u8)| {
        tx.send(a + b).unwrap();
    });

    emitter.emit(EventId(6), (2u8, 3u8)).unwrap();
    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), 5);
}
