//! Real-time dispatch core: connection registry, shared session state,
//! per-connection message routing, audience matching, and broadcast
//! delivery with bounded retry.

pub mod broadcast;
pub mod matching;
pub mod registry;
pub mod router;
pub mod store;

#[cfg(test)]
mod test_support;

pub use registry::{ClientSession, ConnectionRegistry, MessageSink, SinkClosed};
pub use router::Dispatcher;
pub use store::MemoryStateStore;
