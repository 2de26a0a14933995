pub mod geo;
pub mod messages;

pub use geo::{LatLng, Station, StationState};
pub use messages::{ClientRole, DriverMessage, PassengerMessage, RideAction, StoredState};
