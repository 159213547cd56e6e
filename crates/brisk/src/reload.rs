// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Live-reload events and the session broadcaster.
//!
//! # Wire format
//!
//! Events are JSON objects tagged by `type`:
//!
//! ```json
//! {"type":"recompiling"}
//! {"type":"reload","file":"pages/about.jsx"}
//! ```
//!
//! # Delivery
//!
//! [`Broadcaster::announce`] never waits on a session. Each session is a
//! [`SessionSink`] with a non-blocking `try_deliver`; the first failed
//! delivery removes the session for good.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;

/// Queue depth for channel-backed sessions.
pub const SESSION_BUFFER: usize = 16;

/// Lifecycle event pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadEvent {
    /// A compile cycle is starting.
    Recompiling,
    /// A compile cycle finished successfully; clients should reload.
    Reload {
        /// File whose change triggered the cycle.
        file: String,
    },
}

impl ReloadEvent {
    /// Serializes the event to its JSON wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Why a delivery to a session failed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SessionSendFailure {
    /// The client side has gone away.
    #[error("session closed")]
    Closed,
    /// The session is not draining its queue.
    #[error("session backlog full")]
    Backlogged,
}

/// Destination for reload events belonging to one client.
pub trait SessionSink: Send + Sync {
    /// Hands an event to the session without blocking.
    fn try_deliver(&self, event: &ReloadEvent) -> Result<(), SessionSendFailure>;
}

impl SessionSink for mpsc::Sender<ReloadEvent> {
    fn try_deliver(&self, event: &ReloadEvent) -> Result<(), SessionSendFailure> {
        self.try_send(event.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SessionSendFailure::Backlogged,
            mpsc::error::TrySendError::Closed(_) => SessionSendFailure::Closed,
        })
    }
}

/// Identifier handed out on registration.
pub type SessionId = u64;

struct Session {
    id: SessionId,
    sink: Box<dyn SessionSink>,
}

/// Tracks connected sessions and fans events out to them.
pub struct Broadcaster {
    sessions: Mutex<Vec<Session>>,
    next_id: AtomicU64,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("sessions", &self.session_count())
            .finish()
    }
}

impl Broadcaster {
    /// Creates a broadcaster with no sessions.
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Starts tracking a session.
    pub fn register(&self, sink: Box<dyn SessionSink>) -> SessionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut sessions = self.sessions.lock();
        sessions.push(Session { id, sink });
        tracing::info!("Client connected to live reload ({} active)", sessions.len());
        id
    }

    /// Registers a channel-backed session and returns its receiving end.
    pub fn subscribe(&self) -> (SessionId, mpsc::Receiver<ReloadEvent>) {
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        (self.register(Box::new(tx)), rx)
    }

    /// Stops tracking a session. Returns false if it was already gone.
    pub fn remove(&self, id: SessionId) -> bool {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        let removed = sessions.len() != before;
        if removed {
            tracing::info!("Client disconnected from live reload ({} active)", sessions.len());
        }
        removed
    }

    /// Sends an event to every session, dropping those that fail.
    ///
    /// Returns the number of sessions the event was delivered to.
    pub fn announce(&self, event: &ReloadEvent) -> usize {
        let mut sessions = self.sessions.lock();
        if sessions.is_empty() {
            tracing::debug!("No clients connected");
            return 0;
        }

        let mut delivered = 0;
        sessions.retain(|session| match session.sink.try_deliver(event) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(e) => {
                tracing::warn!("Dropping live reload session {}: {}", session.id, e);
                false
            }
        });
        tracing::debug!("Broadcast {:?} to {} client(s)", event, delivered);
        delivered
    }

    /// Ids of the sessions currently tracked, in registration order.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.lock().iter().map(|s| s.id).collect()
    }

    /// Number of sessions currently tracked.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recording {
        received: Mutex<Vec<ReloadEvent>>,
    }

    struct RecordingSink(Arc<Recording>);

    impl SessionSink for RecordingSink {
        fn try_deliver(&self, event: &ReloadEvent) -> Result<(), SessionSendFailure> {
            self.0.received.lock().push(event.clone());
            Ok(())
        }
    }

    struct DeadSink;

    impl SessionSink for DeadSink {
        fn try_deliver(&self, _: &ReloadEvent) -> Result<(), SessionSendFailure> {
            Err(SessionSendFailure::Closed)
        }
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(ReloadEvent::Recompiling.to_json().unwrap(), r#"{"type":"recompiling"}"#);
        assert_eq!(
            ReloadEvent::Reload { file: "pages/a.jsx".to_string() }.to_json().unwrap(),
            r#"{"type":"reload","file":"pages/a.jsx"}"#
        );
        let parsed: ReloadEvent = serde_json::from_str(r#"{"type":"reload","file":"x.css"}"#).unwrap();
        assert_eq!(parsed, ReloadEvent::Reload { file: "x.css".to_string() });
    }

    #[test]
    fn test_failed_session_is_isolated_and_dropped() {
        let broadcaster = Broadcaster::new();
        let first = Arc::new(Recording::default());
        let third = Arc::new(Recording::default());

        let id1 = broadcaster.register(Box::new(RecordingSink(first.clone())));
        let id2 = broadcaster.register(Box::new(DeadSink));
        let id3 = broadcaster.register(Box::new(RecordingSink(third.clone())));

        let delivered = broadcaster.announce(&ReloadEvent::Recompiling);
        assert_eq!(delivered, 2);
        assert_eq!(first.received.lock().as_slice(), &[ReloadEvent::Recompiling]);
        assert_eq!(third.received.lock().as_slice(), &[ReloadEvent::Recompiling]);
        assert_eq!(broadcaster.session_ids(), vec![id1, id3]);
        assert!(!broadcaster.session_ids().contains(&id2));
    }

    #[test]
    fn test_dropped_session_is_never_retried() {
        let broadcaster = Broadcaster::new();
        broadcaster.register(Box::new(DeadSink));
        assert_eq!(broadcaster.announce(&ReloadEvent::Recompiling), 0);
        assert_eq!(broadcaster.session_count(), 0);
        assert_eq!(broadcaster.announce(&ReloadEvent::Recompiling), 0);
    }

    #[tokio::test]
    async fn test_channel_sessions_receive_in_order() {
        let broadcaster = Broadcaster::new();
        let (_, mut rx) = broadcaster.subscribe();

        broadcaster.announce(&ReloadEvent::Recompiling);
        broadcaster.announce(&ReloadEvent::Reload { file: "main.jsx".to_string() });

        assert_eq!(rx.recv().await, Some(ReloadEvent::Recompiling));
        assert_eq!(rx.recv().await, Some(ReloadEvent::Reload { file: "main.jsx".to_string() }));
    }

    #[test]
    fn test_closed_channel_session_is_dropped() {
        let broadcaster = Broadcaster::new();
        let (_, rx) = broadcaster.subscribe();
        drop(rx);
        assert_eq!(broadcaster.announce(&ReloadEvent::Recompiling), 0);
        assert_eq!(broadcaster.session_count(), 0);
    }

    #[test]
    fn test_stalled_channel_session_is_dropped() {
        let broadcaster = Broadcaster::new();
        let (_, _rx) = broadcaster.subscribe();
        for _ in 0..SESSION_BUFFER {
            assert_eq!(broadcaster.announce(&ReloadEvent::Recompiling), 1);
        }
        assert_eq!(broadcaster.announce(&ReloadEvent::Recompiling), 0);
        assert_eq!(broadcaster.session_count(), 0);
    }

    #[test]
    fn test_remove() {
        let broadcaster = Broadcaster::new();
        let (id, _rx) = broadcaster.subscribe();
        assert!(broadcaster.remove(id));
        assert!(!broadcaster.remove(id));
    }
}
