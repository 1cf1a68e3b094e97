//! Server failure correlation keyed by call id.
//!
//! The server side records an unhandled failure under the `call-id` header
//! of the request that caused it; the client side takes it back once the
//! response arrived. Each call id is begun, recorded, and taken at most once.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tether_core::CallId;
use tracing::{debug, warn};

/// A failure raised while the server handled a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedFailure {
    /// Failure kind, e.g. the server's error type name.
    pub kind: String,
    /// Human readable message.
    pub message: String,
}

impl RecordedFailure {
    /// Create a failure record.
    #[must_use]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RecordedFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Shared store of server failures.
///
/// Injected into the [`TestClient`](crate::TestClient) and into whatever
/// hosts the server, so concurrent tests never share state by accident.
pub trait CorrelationStore: Send + Sync {
    /// Open a slot for a call about to be sent.
    fn begin(&self, call_id: CallId);

    /// Record the failure of a call.
    ///
    /// Returns `false` when the call was never begun or already has a
    /// failure; the first record wins.
    fn record(&self, call_id: CallId, failure: RecordedFailure) -> bool;

    /// Close the slot of a call, returning its failure if one was recorded.
    fn take(&self, call_id: CallId) -> Option<RecordedFailure>;
}

/// In-process [`CorrelationStore`].
#[derive(Debug, Default)]
pub struct InMemoryCorrelationStore {
    slots: Mutex<HashMap<CallId, Option<RecordedFailure>>>,
}

impl InMemoryCorrelationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if no slot is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CorrelationStore for InMemoryCorrelationStore {
    fn begin(&self, call_id: CallId) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.insert(call_id, None).is_some() {
            warn!(%call_id, "call id begun twice, previous slot dropped");
        }
    }

    fn record(&self, call_id: CallId, failure: RecordedFailure) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match slots.get_mut(&call_id) {
            Some(slot) if slot.is_none() => {
                debug!(%call_id, kind = %failure.kind, "server failure recorded");
                *slot = Some(failure);
                true
            }
            Some(_) => {
                warn!(%call_id, "server failure already recorded, ignored");
                false
            }
            None => {
                warn!(%call_id, "server failure for unknown call, ignored");
                false
            }
        }
    }

    fn take(&self, call_id: CallId) -> Option<RecordedFailure> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&call_id)
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert2::check;

    use super::*;

    #[test]
    fn record_then_take_once() {
        let store = InMemoryCorrelationStore::new();
        let call_id = CallId::new();

        store.begin(call_id);
        check!(store.record(call_id, RecordedFailure::new("NotFound", "no such user")));
        check!(!store.record(call_id, RecordedFailure::new("Other", "later")));

        check!(store.take(call_id) == Some(RecordedFailure::new("NotFound", "no such user")));
        check!(store.take(call_id).is_none());
        check!(store.is_empty());
    }

    #[test]
    fn record_requires_begin() {
        let store = InMemoryCorrelationStore::new();
        let call_id = CallId::new();

        check!(!store.record(call_id, RecordedFailure::new("Boom", "x")));
        check!(store.take(call_id).is_none());
    }

    #[test]
    fn take_without_failure_closes_the_slot() {
        let store = InMemoryCorrelationStore::new();
        let call_id = CallId::new();

        store.begin(call_id);
        check!(store.len() == 1);
        check!(store.take(call_id).is_none());
        check!(store.is_empty());
        check!(!store.record(call_id, RecordedFailure::new("Late", "x")));
    }

    #[test]
    fn concurrent_calls_do_not_interfere() {
        let store = Arc::new(InMemoryCorrelationStore::new());
        let handles = (0..16)
            .map(|index| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let call_id = CallId::new();
                    store.begin(call_id);
                    if index % 2 == 0 {
                        store.record(call_id, RecordedFailure::new("Even", index.to_string()));
                    }
                    (index, store.take(call_id))
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            let (index, failure) = handle.join().expect("thread");
            check!(failure.is_some() == (index % 2 == 0));
        }
        check!(store.is_empty());
    }

    #[test]
    fn failure_display() {
        check!(RecordedFailure::new("NotFound", "gone").to_string() == "NotFound: gone");
    }
}
