use serde::{Deserialize, Serialize};

use super::geo::{LatLng, StationState};

/// Which side of the service a connection speaks for.
///
/// Resolved once from the upgrade query string and fixed for the
/// connection's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientRole {
    Passenger,
    Driver,
}

impl ClientRole {
    /// Parse the `role` query parameter of the upgrade request.
    pub fn from_query_param(value: &str) -> Option<Self> {
        match value {
            "passenger" => Some(ClientRole::Passenger),
            "driver" => Some(ClientRole::Driver),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClientRole::Passenger => "passenger",
            ClientRole::Driver => "driver",
        }
    }
}

/// Action code carried by every inbound and outbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideAction {
    RequestBus,
    CancelingRide,
    AcceptingRide,
    UpdateRouteStep,
    KeepAlive,
}

/// Frame sent by a passenger client, and the shape of every broadcast
/// the server derives for an audience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerMessage {
    /// Requested pickup location
    #[serde(default)]
    pub start_location: Option<LatLng>,
    /// Requested destination
    #[serde(default)]
    pub end_location: Option<LatLng>,
    pub action: RideAction,
    /// Human-facing text; filled in by the server on derived broadcasts
    #[serde(default)]
    pub text: String,
}

impl PassengerMessage {
    /// Broadcast copy: only the action and the text travel to the
    /// audience, locations are cleared.
    pub fn derived(action: RideAction, text: impl Into<String>) -> Self {
        Self {
            start_location: None,
            end_location: None,
            action,
            text: text.into(),
        }
    }
}

/// Frame sent by a driver console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverMessage {
    /// Operating agency of the line
    pub agency: String,
    /// Line identifier (e.g. "5")
    pub line_number: String,
    /// Populated only when accepting or canceling a ride
    #[serde(default)]
    pub target_station: Option<LatLng>,
    /// Stops on the current route with their visitation status
    #[serde(default)]
    pub listeners_stations: Vec<StationState>,
    pub action: RideAction,
    #[serde(default)]
    pub text: String,
}

/// Last-known message per connection, as kept in the shared state store.
///
/// Whole-record overwrite on every inbound frame; deleted when the
/// connection closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum StoredState {
    Passenger(PassengerMessage),
    Driver(DriverMessage),
}
