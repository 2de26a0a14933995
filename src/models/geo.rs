use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Geographic coordinate in decimal degrees.
///
/// Equality and hashing compare latitude and longitude rounded to
/// 3 decimal places (~100 m), so client-side GPS jitter maps to the
/// same stop. Raw values are kept for display and transport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both coordinates as thousandths of a degree, rounded half-up.
    fn millidegrees(self) -> (i64, i64) {
        (to_millidegrees(self.latitude), to_millidegrees(self.longitude))
    }
}

fn to_millidegrees(value: f64) -> i64 {
    (value * 1000.0).round() as i64
}

impl PartialEq for LatLng {
    fn eq(&self, other: &Self) -> bool {
        self.millidegrees() == other.millidegrees()
    }
}

impl Eq for LatLng {}

impl Hash for LatLng {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.millidegrees().hash(state);
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// A stop on a bus line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Station {
    /// Display name of the stop
    pub name: String,
    /// Geographic position of the stop
    pub location: LatLng,
    /// Position in the line's stop sequence, starting from 1
    pub stop_order: u32,
}

/// A stop on a driver's current route together with its visitation status.
///
/// Equality and hashing consider the station alone: a set of `StationState`
/// de-duplicates by stop identity while `visited` stays mutable across
/// route updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationState {
    pub station: Station,
    pub visited: bool,
}

impl PartialEq for StationState {
    fn eq(&self, other: &Self) -> bool {
        self.station == other.station
    }
}

impl Eq for StationState {}

impl Hash for StationState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.station.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn station(name: &str, lat: f64, lng: f64) -> Station {
        Station {
            name: name.to_string(),
            location: LatLng::new(lat, lng),
            stop_order: 1,
        }
    }

    #[test]
    fn jittered_coordinates_compare_equal() {
        let reported = LatLng::new(32.0001, 34.7999);
        let stop = LatLng::new(32.000, 34.800);
        assert_eq!(reported, stop);
    }

    #[test]
    fn distinct_stops_compare_unequal() {
        let a = LatLng::new(32.000, 34.800);
        let b = LatLng::new(32.001, 34.800);
        assert_ne!(a, b);
    }

    #[test]
    fn visited_flag_is_ignored_by_equality() {
        let unvisited = StationState {
            station: station("Allenby", 32.0, 34.8),
            visited: false,
        };
        let visited = StationState {
            station: station("Allenby", 32.0, 34.8),
            visited: true,
        };
        assert_eq!(unvisited, visited);
    }

    #[test]
    fn station_set_dedups_by_stop_identity() {
        let mut set = HashSet::new();
        set.insert(StationState {
            station: station("Allenby", 32.0, 34.8),
            visited: false,
        });
        set.insert(StationState {
            station: station("Allenby", 32.0, 34.8),
            visited: true,
        });
        assert_eq!(set.len(), 1);
    }

    proptest! {
        /// Any two raw coordinates that round to the same 3-decimal value
        /// compare equal, regardless of sub-rounding differences.
        #[test]
        fn rounding_equality_tolerates_jitter(
            lat_millis in -90_000i64..=90_000,
            lng_millis in -180_000i64..=180_000,
            jitter_lat_a in -0.00049f64..=0.00049,
            jitter_lng_a in -0.00049f64..=0.00049,
            jitter_lat_b in -0.00049f64..=0.00049,
            jitter_lng_b in -0.00049f64..=0.00049,
        ) {
            let lat = lat_millis as f64 / 1000.0;
            let lng = lng_millis as f64 / 1000.0;
            let a = LatLng::new(lat + jitter_lat_a, lng + jitter_lng_a);
            let b = LatLng::new(lat + jitter_lat_b, lng + jitter_lng_b);
            prop_assert_eq!(a, b);
        }
    }
}
