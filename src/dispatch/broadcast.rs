use tracing::{debug, error, warn};

use crate::models::PassengerMessage;

use super::registry::{ConnectionRegistry, MessageSink};
use super::store::{session_key, StateStore};

/// Delivery attempts per recipient before the connection is evicted.
/// The bound counts attempts, not retries after the first failure.
pub const MAX_SEND_ATTEMPTS: u32 = 3;

/// Send `message` to every session in `audience`.
///
/// One recipient failing never aborts delivery to the rest. Audience ids
/// with no live connection are skipped; a recipient that exhausts its
/// attempts is evicted from both the registry and the state store.
pub fn broadcast(
    registry: &ConnectionRegistry,
    store: &dyn StateStore,
    audience: &[String],
    message: &PassengerMessage,
) {
    let frame = match serde_json::to_string(message) {
        Ok(frame) => frame,
        Err(err) => {
            error!(error = %err, "failed to encode broadcast message");
            return;
        }
    };

    for session_id in audience {
        let Some(session) = registry.get(session_id) else {
            debug!(session_id = %session_id, "skipping stale audience entry");
            continue;
        };

        if !send_with_retry(session.sink.as_ref(), &frame, session_id) {
            warn!(
                session_id = %session_id,
                attempts = MAX_SEND_ATTEMPTS,
                "delivery failed, evicting connection"
            );
            registry.remove(session_id);
            store.delete(&session_key(session_id));
        }
    }
}

fn send_with_retry(sink: &dyn MessageSink, frame: &str, session_id: &str) -> bool {
    for attempt in 1..=MAX_SEND_ATTEMPTS {
        match sink.send_text(frame) {
            Ok(()) => return true,
            Err(err) => {
                warn!(
                    session_id = %session_id,
                    attempt,
                    error = %err,
                    "delivery attempt failed"
                );
            }
        }
    }
    false
}
