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

//! Delivery disciplines a listener can be registered with.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a listener is invoked when its event is emitted.
///
/// The discriminants are stable and may be persisted or compared externally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventType {
    /// Invoked synchronously on the emitting thread before `emit` returns.
    #[default]
    Immediate = 0,
    /// Queued for the registering thread and invoked when it calls
    /// `process_events`.
    ThreadLocal = 1,
    /// Launched on a separate thread; `emit` neither waits nor observes it.
    Async = 2,
}

impl TryFrom<u8> for EventType {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Immediate),
            1 => Ok(Self::ThreadLocal),
            2 => Ok(Self::Async),
            other => Err(other),
        }
    }
}

impl From<EventType> for u8 {
    fn from(mode: EventType) -> Self {
        mode as u8
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Immediate => "immediate",
            Self::ThreadLocal => "thread-local",
            Self::Async => "async",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminants_are_stable() {
        assert_eq!(u8::from(EventType::Immediate), 0);
        assert_eq!(u8::from(EventType::ThreadLocal), 1);
        assert_eq!(u8::from(EventType::Async), 2);
    }

    #[test]
    fn test_try_from_rejects_unknown_values() {
        assert_eq!(EventType::try_from(1), Ok(EventType::ThreadLocal));
        assert_eq!(EventType::try_from(3), Err(3));
    }

    #[test]
    fn test_default_is_immediate() {
        assert_eq!(EventType::default(), EventType::Immediate);
    }
}
