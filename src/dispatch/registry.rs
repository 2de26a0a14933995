use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::ClientRole;

/// Delivery failed because the connection's writer side is gone.
#[derive(Debug, Error)]
#[error("connection is closed")]
pub struct SinkClosed;

/// Live outbound handle for one connection.
///
/// The production implementation wraps the channel feeding the socket
/// writer task; tests substitute sinks that fail on demand.
pub trait MessageSink: Send + Sync {
    /// Queue one complete text frame for delivery.
    fn send_text(&self, frame: &str) -> Result<(), SinkClosed>;
    fn is_open(&self) -> bool;
    /// Close the underlying connection. Safe to call more than once.
    fn close(&self);
}

/// Registry record for one live connection. Never serialized; the socket
/// cannot be handed between processes, only its last-known state can.
#[derive(Clone)]
pub struct ClientSession {
    pub role: ClientRole,
    pub sink: Arc<dyn MessageSink>,
}

/// Process-local map from session id to live connection.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    sessions: Arc<DashMap<String, ClientSession>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection. Registering a sink that is already
    /// closed is a no-op; the connection's own cleanup path runs anyway.
    pub fn add(&self, session_id: &str, session: ClientSession) {
        if !session.sink.is_open() {
            warn!(session_id = %session_id, "refusing to register a closed connection");
            return;
        }
        let role = session.role;
        self.sessions.insert(session_id.to_owned(), session);
        debug!(
            session_id = %session_id,
            role = role.as_str(),
            total = self.sessions.len(),
            "session registered"
        );
    }

    /// Close the connection if still open and drop the mapping.
    /// Removing an unknown id is a no-op.
    pub fn remove(&self, session_id: &str) {
        if let Some((_, session)) = self.sessions.remove(session_id) {
            if session.sink.is_open() {
                session.sink.close();
            }
            debug!(
                session_id = %session_id,
                total = self.sessions.len(),
                "session removed"
            );
        }
    }

    pub fn get(&self, session_id: &str) -> Option<ClientSession> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::FakeSink;
    use super::*;

    fn session(sink: Arc<FakeSink>) -> ClientSession {
        ClientSession {
            role: ClientRole::Passenger,
            sink,
        }
    }

    #[test]
    fn add_then_get_returns_the_session() {
        let registry = ConnectionRegistry::new();
        let sink = Arc::new(FakeSink::new());
        registry.add("p-1", session(sink));

        let found = registry.get("p-1").expect("session should be registered");
        assert_eq!(found.role, ClientRole::Passenger);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn closed_sink_is_not_registered() {
        let registry = ConnectionRegistry::new();
        let sink = Arc::new(FakeSink::new());
        sink.close();

        registry.add("p-1", session(sink));
        assert!(registry.get("p-1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_closes_the_connection() {
        let registry = ConnectionRegistry::new();
        let sink = Arc::new(FakeSink::new());
        registry.add("p-1", session(sink.clone()));

        registry.remove("p-1");
        assert!(!sink.is_open());
        assert!(registry.get("p-1").is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let sink = Arc::new(FakeSink::new());
        registry.add("p-1", session(sink));

        registry.remove("p-1");
        registry.remove("p-1");
        assert!(registry.is_empty());
    }
}
