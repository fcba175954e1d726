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

//! The listener registry: event buckets, the id counter and the bookkeeping
//! needed for once-listeners whose invocation is still queued.
//!
//! A `Registry` has no locking of its own; the emitter guards it with a single
//! mutex and never runs callbacks while holding it.

use super::listener::{Callback, ListenerRecord};
use super::{EventId, EventType, ListenerId};
use crate::error::DispatchError;
use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;

/// A listener selected for one emission, with its callback already recovered.
pub(crate) struct Dispatch<A> {
    pub(crate) id: ListenerId,
    pub(crate) mode: EventType,
    pub(crate) owner: ThreadId,
    pub(crate) once: bool,
    pub(crate) active: Arc<AtomicBool>,
    pub(crate) callback: Callback<A>,
}

/// A thread-local once-listener that left its bucket when an emission claimed
/// it, but whose queued invocation has not been drained yet.
#[derive(Debug)]
struct PendingOnce {
    event: EventId,
    active: Arc<AtomicBool>,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    buckets: BTreeMap<EventId, Vec<ListenerRecord>>,
    last_listener_id: u64,
    /// Once-listeners already claimed by an emission whose thread-local
    /// invocation has not been drained yet.
    claimed: HashMap<ListenerId, PendingOnce>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a listener to the bucket of `event` and returns its fresh id.
    pub(crate) fn insert<A: 'static>(
        &mut self,
        event: EventId,
        mode: EventType,
        owner: ThreadId,
        once: bool,
        callback: Callback<A>,
    ) -> ListenerId {
        self.last_listener_id += 1;
        let id = ListenerId(self.last_listener_id);
        let record = ListenerRecord::new(id, mode, owner, once, callback);

        let bucket = self.buckets.entry(event).or_default();
        if let Some(existing) = bucket.first() {
            if existing.signature() != record.signature() {
                log::warn!(
                    "Listener {id} on event {event} takes `{}` but listener {} takes `{}`; emits will fail.",
                    record.signature(),
                    existing.id,
                    existing.signature()
                );
            }
        }
        bucket.push(record);
        id
    }

    /// Removes a listener wherever it lives. Returns `false` for unknown ids.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let mut emptied = None;
        let mut found = false;
        for (event, bucket) in self.buckets.iter_mut() {
            if let Some(index) = bucket.iter().position(|record| record.id == id) {
                bucket.remove(index).deactivate();
                found = true;
                if bucket.is_empty() {
                    emptied = Some(*event);
                }
                break;
            }
        }
        if let Some(event) = emptied {
            self.buckets.remove(&event);
        }
        if found {
            return true;
        }

        match self.claimed.remove(&id) {
            Some(pending) => {
                pending.active.store(false, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Removes every listener of `event`, including claimed once-listeners
    /// still waiting to be drained. Returns how many were removed.
    pub(crate) fn remove_event(&mut self, event: EventId) -> usize {
        let mut removed = match self.buckets.remove(&event) {
            Some(bucket) => {
                bucket.iter().for_each(ListenerRecord::deactivate);
                bucket.len()
            }
            None => 0,
        };
        self.claimed.retain(|_, pending| {
            if pending.event != event {
                return true;
            }
            pending.active.store(false, Ordering::Release);
            removed += 1;
            false
        });
        removed
    }

    /// Selects the listeners of `event` for one emission with arguments `A`.
    ///
    /// Every record must accept `A`; otherwise nothing is selected and the
    /// registry is left untouched. Once-listeners are removed here, so no
    /// other emission can select them again.
    pub(crate) fn claim<A: 'static>(
        &mut self,
        event: EventId,
    ) -> Result<Vec<Dispatch<A>>, DispatchError> {
        let Some(bucket) = self.buckets.get_mut(&event) else {
            return Ok(Vec::new());
        };

        let mut selected = Vec::with_capacity(bucket.len());
        for record in bucket.iter() {
            let callback =
                record
                    .typed::<A>()
                    .ok_or_else(|| DispatchError::SignatureMismatch {
                        event,
                        listener: record.id,
                        expected: record.signature(),
                        found: type_name::<A>(),
                    })?;
            selected.push(Dispatch {
                id: record.id,
                mode: record.mode,
                owner: record.owner,
                once: record.once,
                active: Arc::clone(&record.active),
                callback,
            });
        }

        if selected.iter().any(|dispatch| dispatch.once) {
            bucket.retain(|record| !record.once);
            if bucket.is_empty() {
                self.buckets.remove(&event);
            }
            for dispatch in selected.iter().filter(|d| d.once) {
                if dispatch.mode == EventType::ThreadLocal {
                    self.claimed.insert(
                        dispatch.id,
                        PendingOnce {
                            event,
                            active: Arc::clone(&dispatch.active),
                        },
                    );
                }
            }
        }

        Ok(selected)
    }

    /// Forgets a claimed once-listener once its queued invocation is drained
    /// or dropped.
    pub(crate) fn settle(&mut self, id: ListenerId) {
        self.claimed.remove(&id);
    }

    pub(crate) fn listener_count(&self, event: EventId) -> usize {
        self.buckets.get(&event).map_or(0, Vec::len)
    }

    pub(crate) fn event_ids(&self) -> Vec<EventId> {
        self.buckets.keys().copied().collect()
    }

    pub(crate) fn total_listeners(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn noop<A: 'static>() -> Callback<A> {
        Arc::new(|_| {})
    }

    fn insert<A: 'static>(registry: &mut Registry, event: u32, once: bool) -> ListenerId {
        registry.insert(
            EventId(event),
            EventType::Immediate,
            thread::current().id(),
            once,
            noop::<A>(),
        )
    }

    #[test]
    fn test_ids_are_strictly_increasing() {
        let mut registry = Registry::new();
        let a = insert::<()>(&mut registry, 1, false);
        let b = insert::<()>(&mut registry, 2, false);
        registry.remove(b);
        let c = insert::<()>(&mut registry, 1, false);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_claim_preserves_registration_order() {
        let mut registry = Registry::new();
        let ids: Vec<_> = (0..4).map(|_| insert::<()>(&mut registry, 5, false)).collect();
        let claimed: Vec<_> = registry
            .claim::<()>(EventId(5))
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(claimed, ids);
        assert_eq!(registry.listener_count(EventId(5)), 4);
    }

    #[test]
    fn test_claim_removes_once_listeners() {
        let mut registry = Registry::new();
        insert::<()>(&mut registry, 1, false);
        insert::<()>(&mut registry, 1, true);

        assert_eq!(registry.claim::<()>(EventId(1)).unwrap().len(), 2);
        assert_eq!(registry.claim::<()>(EventId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_claim_mismatch_leaves_registry_untouched() {
        let mut registry = Registry::new();
        insert::<(i32,)>(&mut registry, 1, true);

        let err = registry.claim::<()>(EventId(1)).err().unwrap();
        assert!(matches!(
            err,
            DispatchError::SignatureMismatch { expected: "(i32,)", found: "()", .. }
        ));
        assert_eq!(registry.listener_count(EventId(1)), 1);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut registry = Registry::new();
        let id = insert::<()>(&mut registry, 1, false);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(!registry.remove(ListenerId(999)));
        assert!(registry.event_ids().is_empty());
    }

    #[test]
    fn test_remove_reaches_claimed_thread_local_once() {
        let mut registry = Registry::new();
        let id = registry.insert(
            EventId(1),
            EventType::ThreadLocal,
            thread::current().id(),
            true,
            noop::<()>(),
        );
        let claimed = registry.claim::<()>(EventId(1)).unwrap();
        assert_eq!(registry.listener_count(EventId(1)), 0);

        assert!(registry.remove(id));
        assert!(!claimed[0].active.load(Ordering::Acquire));
    }

    #[test]
    fn test_remove_event_drops_bucket() {
        let mut registry = Registry::new();
        insert::<()>(&mut registry, 1, false);
        insert::<()>(&mut registry, 1, false);
        insert::<()>(&mut registry, 2, false);

        assert_eq!(registry.remove_event(EventId(1)), 2);
        assert_eq!(registry.event_ids(), vec![EventId(2)]);
        assert_eq!(registry.total_listeners(), 1);
    }

    #[test]
    fn test_remove_event_reaches_claimed_thread_local_once() {
        let mut registry = Registry::new();
        let owner = thread::current().id();
        registry.insert(EventId(1), EventType::ThreadLocal, owner, true, noop::<()>());
        let other = registry.insert(EventId(2), EventType::ThreadLocal, owner, true, noop::<()>());
        let first = registry.claim::<()>(EventId(1)).unwrap();
        let second = registry.claim::<()>(EventId(2)).unwrap();

        assert_eq!(registry.remove_event(EventId(1)), 1);
        assert!(!first[0].active.load(Ordering::Acquire));
        assert!(second[0].active.load(Ordering::Acquire));
        assert_eq!(registry.remove_event(EventId(1)), 0);
        assert!(registry.remove(other));
    }

    #[test]
    fn test_settled_once_listener_is_no_longer_removable() {
        let mut registry = Registry::new();
        let id = registry.insert(
            EventId(1),
            EventType::ThreadLocal,
            thread::current().id(),
            true,
            noop::<()>(),
        );
        registry.claim::<()>(EventId(1)).unwrap();

        registry.settle(id);
        assert!(!registry.remove(id));
    }
}
