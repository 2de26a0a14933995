//! Shared fakes and builders for the dispatch tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::models::{
    ClientRole, DriverMessage, LatLng, PassengerMessage, RideAction, Station, StationState,
    StoredState,
};

use super::registry::{ClientSession, ConnectionRegistry, MessageSink, SinkClosed};

/// In-memory sink that records delivered frames and fails on demand.
pub struct FakeSink {
    sent: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    failures_left: AtomicUsize,
    open: AtomicBool,
}

impl FakeSink {
    /// A healthy sink: every send succeeds.
    pub fn new() -> Self {
        Self::failing_times(0)
    }

    /// Fails the first `failures` sends, then delivers.
    pub fn failing_times(failures: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
            open: AtomicBool::new(true),
        }
    }

    /// Fails every send, as a dead transport would.
    pub fn always_failing() -> Self {
        Self::failing_times(usize::MAX)
    }

    /// Total send attempts observed, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl MessageSink for FakeSink {
    fn send_text(&self, frame: &str) -> Result<(), SinkClosed> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.open.load(Ordering::SeqCst) {
            return Err(SinkClosed);
        }
        let failures = self.failures_left.load(Ordering::SeqCst);
        if failures > 0 {
            if failures != usize::MAX {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
            }
            return Err(SinkClosed);
        }
        self.sent.lock().unwrap().push(frame.to_owned());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

/// Register a session with the given role and sink.
pub fn registered(
    registry: &ConnectionRegistry,
    session_id: &str,
    role: ClientRole,
    sink: Arc<FakeSink>,
) {
    registry.add(session_id, ClientSession { role, sink });
}

/// Driver state entry with the given line and route.
pub fn driver_state(agency: &str, line: &str, stations: Vec<StationState>) -> StoredState {
    StoredState::Driver(DriverMessage {
        agency: agency.to_string(),
        line_number: line.to_string(),
        target_station: None,
        listeners_stations: stations,
        action: RideAction::UpdateRouteStep,
        text: String::new(),
    })
}

/// Passenger state entry waiting for pickup at `start`.
pub fn passenger_state(start: LatLng, end: LatLng) -> StoredState {
    StoredState::Passenger(PassengerMessage {
        start_location: Some(start),
        end_location: Some(end),
        action: RideAction::RequestBus,
        text: String::new(),
    })
}

pub fn station_state(name: &str, location: LatLng, visited: bool) -> StationState {
    StationState {
        station: Station {
            name: name.to_string(),
            location,
            stop_order: 1,
        },
        visited,
    }
}
