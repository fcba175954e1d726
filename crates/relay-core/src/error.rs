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

//! Error types surfaced by the emitter and its configuration.

use crate::event::{EventId, ListenerId};

/// An error raised while dispatching an event.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// `emit` was called with an argument type that differs from the one a
    /// listener for that event was registered with. No listener was invoked.
    #[error(
        "listener {listener} on event {event} expects arguments `{expected}`, but `{found}` was emitted"
    )]
    SignatureMismatch {
        /// The event that was emitted.
        event: EventId,
        /// The first listener whose signature did not match.
        listener: ListenerId,
        /// The argument type the listener was registered with.
        expected: &'static str,
        /// The argument type supplied to `emit`.
        found: &'static str,
    },
    /// The async dispatcher could not launch a job.
    #[error("failed to launch async listener {listener}: {reason}")]
    AsyncSpawn {
        /// The listener whose invocation was dropped.
        listener: ListenerId,
        /// Why the dispatcher refused the job.
        reason: String,
    },
}

/// An error raised while loading an [`EmitterConfig`](crate::EmitterConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration document is not valid JSON for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_mismatch_message_names_both_types() {
        let err = DispatchError::SignatureMismatch {
            event: EventId(3),
            listener: ListenerId(9),
            expected: "(i32,)",
            found: "()",
        };
        let text = err.to_string();
        assert!(text.contains("listener #9"));
        assert!(text.contains("event 3"));
        assert!(text.contains("`(i32,)`"));
        assert!(text.contains("`()`"));
    }
}
