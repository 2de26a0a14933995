//! Audience selection over a snapshot of the shared state store.
//!
//! Both queries are read-only and side-effect free. Visitation state is
//! never mutated here; it changes only when a driver sends a fresh route
//! update. Store entries without a live registry counterpart are expected
//! transient state and are dropped from the result.

use std::collections::HashSet;

use crate::models::{LatLng, StoredState};

use super::registry::ConnectionRegistry;
use super::store::{StateStore, SESSION_KEY_PREFIX};

/// Driver sessions on one of `relevant_lines` whose route still passes
/// `station` without having visited it.
pub fn find_drivers_for(
    store: &dyn StateStore,
    registry: &ConnectionRegistry,
    relevant_lines: &HashSet<String>,
    station: &LatLng,
) -> Vec<String> {
    store
        .scan_by_prefix(SESSION_KEY_PREFIX)
        .into_iter()
        .filter_map(|(key, state)| {
            let session_id = key.strip_prefix(SESSION_KEY_PREFIX)?;
            let StoredState::Driver(driver) = state else {
                return None;
            };
            if !relevant_lines.contains(&driver.line_number) {
                return None;
            }
            let on_route = driver
                .listeners_stations
                .iter()
                .any(|stop| stop.station.location == *station);
            let already_passed = driver
                .listeners_stations
                .iter()
                .any(|stop| stop.visited && stop.station.location == *station);
            if !on_route || already_passed {
                return None;
            }
            registry.get(session_id)?;
            Some(session_id.to_owned())
        })
        .collect()
}

/// Passenger sessions whose requested pickup location equals `station`.
pub fn find_passengers_for(
    store: &dyn StateStore,
    registry: &ConnectionRegistry,
    station: &LatLng,
) -> Vec<String> {
    store
        .scan_by_prefix(SESSION_KEY_PREFIX)
        .into_iter()
        .filter_map(|(key, state)| {
            let session_id = key.strip_prefix(SESSION_KEY_PREFIX)?;
            let StoredState::Passenger(passenger) = state else {
                return None;
            };
            if passenger.start_location.as_ref() != Some(station) {
                return None;
            }
            registry.get(session_id)?;
            Some(session_id.to_owned())
        })
        .collect()
}
