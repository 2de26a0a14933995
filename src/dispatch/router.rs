use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::models::{
    ClientRole, DriverMessage, PassengerMessage, RideAction, StoredState,
};
use crate::providers::routes::RouteDirectory;

use super::broadcast::broadcast;
use super::matching::{find_drivers_for, find_passengers_for};
use super::registry::{ClientSession, ConnectionRegistry};
use super::store::{session_key, StateStore};

/// Errors that end the offending connection. Everything recoverable is
/// logged and swallowed inside the dispatcher instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("malformed frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),
}

/// Per-connection message router over the shared registry and store.
///
/// Frames from a single connection are processed in arrival order; there
/// is no ordering guarantee across connections.
pub struct Dispatcher {
    registry: ConnectionRegistry,
    store: Arc<dyn StateStore>,
    routes: RouteDirectory,
}

impl Dispatcher {
    pub fn new(
        registry: ConnectionRegistry,
        store: Arc<dyn StateStore>,
        routes: RouteDirectory,
    ) -> Self {
        Self {
            registry,
            store,
            routes,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn handle_connect(&self, session_id: &str, session: ClientSession) {
        self.registry.add(session_id, session);
    }

    /// Route one inbound text frame. `Err` means the frame did not decode
    /// and the caller must tear the connection down.
    pub async fn handle_frame(
        &self,
        session_id: &str,
        role: ClientRole,
        frame: &str,
    ) -> Result<(), DispatchError> {
        match role {
            ClientRole::Passenger => {
                let message: PassengerMessage = serde_json::from_str(frame)?;
                self.handle_passenger(session_id, message).await;
            }
            ClientRole::Driver => {
                let message: DriverMessage = serde_json::from_str(frame)?;
                self.handle_driver(session_id, message);
            }
        }
        Ok(())
    }

    /// Tear-down for close and transport error alike. Idempotent, and
    /// safe to call for sessions that were never registered.
    pub fn handle_disconnect(&self, session_id: &str) {
        self.registry.remove(session_id);
        self.store.delete(&session_key(session_id));
    }

    async fn handle_passenger(&self, session_id: &str, message: PassengerMessage) {
        match message.action {
            RideAction::RequestBus | RideAction::CancelingRide => {
                self.notify_drivers(session_id, message).await;
            }
            RideAction::KeepAlive => {
                debug!(session_id = %session_id, "passenger keep-alive");
            }
            other => {
                warn!(
                    session_id = %session_id,
                    action = ?other,
                    "unsupported passenger action, dropping frame"
                );
            }
        }
    }

    /// Shared path for pickup requests and cancellations: both store the
    /// passenger's state and notify the same driver audience, selected by
    /// the lines that serve the passenger's start and end stops.
    async fn notify_drivers(&self, session_id: &str, message: PassengerMessage) {
        let action = message.action;
        let (Some(start), Some(end)) = (message.start_location, message.end_location) else {
            warn!(
                session_id = %session_id,
                "passenger frame without locations, dropping"
            );
            return;
        };

        self.store
            .set(&session_key(session_id), StoredState::Passenger(message));

        let relevant_lines = match self.routes.relevant_lines(&start, &end).await {
            Ok(lines) => lines,
            Err(err) => {
                error!(
                    session_id = %session_id,
                    error = %err,
                    "line lookup failed, dropping frame"
                );
                return;
            }
        };

        let station_name = match self.routes.station_name(&start).await {
            Ok(Some(name)) => name,
            Ok(None) => start.to_string(),
            Err(err) => {
                error!(
                    session_id = %session_id,
                    error = %err,
                    "station lookup failed, dropping frame"
                );
                return;
            }
        };

        let audience = find_drivers_for(self.store.as_ref(), &self.registry, &relevant_lines, &start);
        if audience.is_empty() {
            info!(
                session_id = %session_id,
                station = %station_name,
                "no drivers to notify"
            );
            return;
        }

        let text = match action {
            RideAction::CancelingRide => {
                format!("A passenger at {station_name} has canceled their ride")
            }
            _ => format!("A passenger at {station_name} is waiting for a pick-up, approve?"),
        };
        let derived = PassengerMessage::derived(action, text);
        broadcast(&self.registry, self.store.as_ref(), &audience, &derived);
        info!(
            session_id = %session_id,
            drivers = audience.len(),
            action = ?action,
            "notified drivers"
        );
    }

    fn handle_driver(&self, session_id: &str, message: DriverMessage) {
        match message.action {
            RideAction::AcceptingRide | RideAction::CancelingRide => {
                self.answer_passengers(session_id, message);
            }
            RideAction::UpdateRouteStep => {
                self.store
                    .set(&session_key(session_id), StoredState::Driver(message));
                debug!(session_id = %session_id, "driver route updated");
            }
            other => {
                warn!(
                    session_id = %session_id,
                    action = ?other,
                    "unsupported driver action, dropping frame"
                );
            }
        }
    }

    /// A driver accepted or canceled a pickup: tell the passengers
    /// waiting at the target station.
    fn answer_passengers(&self, session_id: &str, message: DriverMessage) {
        let action = message.action;
        let Some(target) = message.target_station else {
            warn!(
                session_id = %session_id,
                "driver frame without target station, dropping"
            );
            return;
        };
        let agency = message.agency.clone();
        let line_number = message.line_number.clone();

        self.store
            .set(&session_key(session_id), StoredState::Driver(message));

        let audience = find_passengers_for(self.store.as_ref(), &self.registry, &target);
        if audience.is_empty() {
            info!(
                session_id = %session_id,
                station = %target,
                "no passengers waiting at the target station"
            );
            return;
        }

        let text = match action {
            RideAction::CancelingRide => {
                format!("Bus from {agency} with line number {line_number} could not pick you up")
            }
            _ => format!("Bus from {agency} with line number {line_number} is heading your way"),
        };
        let derived = PassengerMessage::derived(action, text);
        broadcast(&self.registry, self.store.as_ref(), &audience, &derived);
        info!(
            session_id = %session_id,
            passengers = audience.len(),
            action = ?action,
            "answered waiting passengers"
        );
    }
}
