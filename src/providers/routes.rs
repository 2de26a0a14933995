//! Client for the external routes subsystem.
//!
//! The routes service owns the relational station/line data; this core
//! only asks it two questions while matching: which lines serve a
//! passenger's start and end stops, and what a stop is called.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::LatLng;

#[derive(Debug, Error)]
pub enum RoutesError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Routes service returned HTTP {0}")]
    Api(u16),
    #[error("Parse error: {0}")]
    Parse(String),
}

/// HTTP client for the routes service.
pub struct RoutesClient {
    client: Client,
    base_url: String,
}

impl RoutesClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RoutesError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RoutesError::Network(format!("Failed to build HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, base_url })
    }

    /// Lines that pass through both the start and the end stop.
    pub async fn relevant_lines(
        &self,
        start: &LatLng,
        end: &LatLng,
    ) -> Result<HashSet<String>, RoutesError> {
        let url = format!("{}/lines/relevant", self.base_url);
        let query = [
            ("start_lat", start.latitude.to_string()),
            ("start_lng", start.longitude.to_string()),
            ("end_lat", end.latitude.to_string()),
            ("end_lng", end.longitude.to_string()),
        ];
        let response: RelevantLinesResponse = self.get_json(&url, &query).await?;
        debug!(lines = response.lines.len(), "relevant line lookup");
        Ok(response.lines.into_iter().collect())
    }

    /// Display name of the stop at `location`, if one is known.
    pub async fn station_name(&self, location: &LatLng) -> Result<Option<String>, RoutesError> {
        let url = format!("{}/stations/name", self.base_url);
        let query = [
            ("lat", location.latitude.to_string()),
            ("lng", location.longitude.to_string()),
        ];
        let response: StationNameResponse = self.get_json(&url, &query).await?;
        Ok(response.name)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, RoutesError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| RoutesError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutesError::Api(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RoutesError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct RelevantLinesResponse {
    lines: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StationNameResponse {
    name: Option<String>,
}

/// Routes lookups behind a single front, so the dispatcher can run
/// against the live service or a fixture table (development and tests
/// without the collaborator).
pub enum RouteDirectory {
    Http(RoutesClient),
    Fixed(FixedRouteTable),
}

impl RouteDirectory {
    pub async fn relevant_lines(
        &self,
        start: &LatLng,
        end: &LatLng,
    ) -> Result<HashSet<String>, RoutesError> {
        match self {
            RouteDirectory::Http(client) => client.relevant_lines(start, end).await,
            RouteDirectory::Fixed(table) => Ok(table.relevant_lines(start, end)),
        }
    }

    pub async fn station_name(&self, location: &LatLng) -> Result<Option<String>, RoutesError> {
        match self {
            RouteDirectory::Http(client) => client.station_name(location).await,
            RouteDirectory::Fixed(table) => Ok(table.station_name(location)),
        }
    }
}

/// Static route table serving lookups from memory.
///
/// Lookups use the same rounded-coordinate equality as matching, so a
/// jittered client position resolves to its configured stop.
#[derive(Default)]
pub struct FixedRouteTable {
    legs: Vec<RouteLeg>,
    station_names: Vec<(LatLng, String)>,
}

struct RouteLeg {
    start: LatLng,
    end: LatLng,
    lines: HashSet<String>,
}

impl FixedRouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare which lines serve the leg between two stops.
    pub fn with_leg(mut self, start: LatLng, end: LatLng, lines: &[&str]) -> Self {
        self.legs.push(RouteLeg {
            start,
            end,
            lines: lines.iter().map(|line| line.to_string()).collect(),
        });
        self
    }

    pub fn with_station_name(mut self, location: LatLng, name: &str) -> Self {
        self.station_names.push((location, name.to_string()));
        self
    }

    fn relevant_lines(&self, start: &LatLng, end: &LatLng) -> HashSet<String> {
        self.legs
            .iter()
            .filter(|leg| leg.start == *start && leg.end == *end)
            .flat_map(|leg| leg.lines.iter().cloned())
            .collect()
    }

    fn station_name(&self, location: &LatLng) -> Option<String> {
        self.station_names
            .iter()
            .find(|(stop, _)| stop == location)
            .map(|(_, name)| name.clone())
    }
}
