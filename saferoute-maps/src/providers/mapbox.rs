//! Mapbox commercial backend: Directions v5 and forward geocoding v6.
//!
//! See: <https://docs.mapbox.com/api/navigation/directions/>

use std::time::Duration;

use async_trait::async_trait;
use saferoute_core::{Coordinate, ProviderError, RouteCandidate, RoutingProvider};
use serde::Deserialize;

use super::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError, build_client,
    canonical_base_url, check_status, path_from_lonlat, transport_error,
};

pub(crate) const PROVIDER_NAME: &str = "mapbox";

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

/// Configuration for [`MapboxProvider`].
#[derive(Debug, Clone)]
pub struct MapboxConfig {
    /// API access token.
    pub access_token: String,
    /// Base URL, overridable for testing.
    pub base_url: String,
    /// Per-call request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl MapboxConfig {
    /// Create a configuration with the given access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Directions v5 response.
#[derive(Debug, Deserialize)]
pub(crate) struct DirectionsResponse {
    pub code: String,
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<MapboxRoute>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MapboxRoute {
    pub distance: f64,
    pub duration: f64,
    pub geometry: MapboxGeometry,
    #[serde(default)]
    pub legs: Vec<MapboxLeg>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MapboxGeometry {
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MapboxLeg {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub steps: Vec<MapboxStep>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MapboxStep {
    pub maneuver: MapboxManeuver,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MapboxManeuver {
    #[serde(default)]
    pub instruction: String,
}

/// Forward geocoding v6 response.
#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    #[serde(default)]
    pub features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeFeature {
    pub properties: GeocodeProperties,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeProperties {
    pub coordinates: GeocodeCoordinates,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeCoordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// Routing and geocoding backend for the Mapbox APIs.
#[derive(Debug)]
pub struct MapboxProvider {
    client: reqwest::Client,
    config: MapboxConfig,
}

impl MapboxProvider {
    /// Construct a provider.
    ///
    /// # Errors
    /// Returns [`ProviderBuildError`] when the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: MapboxConfig) -> Result<Self, ProviderBuildError> {
        let base_url = canonical_base_url(&config.base_url)?;
        let client = build_client(config.timeout, &config.user_agent)?;
        Ok(Self {
            client,
            config: MapboxConfig { base_url, ..config },
        })
    }

    fn directions_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/directions/v5/mapbox/driving/{},{};{},{}",
            self.config.base_url,
            origin.longitude(),
            origin.latitude(),
            destination.longitude(),
            destination.latitude(),
        )
    }

    fn geocode_url(&self) -> String {
        format!("{}/search/geocode/v6/forward", self.config.base_url)
    }

    fn convert_response(
        &self,
        response: DirectionsResponse,
    ) -> Result<Vec<RouteCandidate>, ProviderError> {
        match response.code.as_str() {
            "Ok" => {}
            "NoRoute" | "NoSegment" => {
                return Err(ProviderError::NoRoute {
                    provider: PROVIDER_NAME.to_owned(),
                });
            }
            code => {
                return Err(ProviderError::Unavailable {
                    provider: PROVIDER_NAME.to_owned(),
                    message: format!("{code}: {}", response.message.unwrap_or_default()),
                });
            }
        }
        if response.routes.is_empty() {
            return Err(ProviderError::NoRoute {
                provider: PROVIDER_NAME.to_owned(),
            });
        }
        let candidates = response
            .routes
            .into_iter()
            .enumerate()
            .map(|(index, route)| {
                let summary = route
                    .legs
                    .iter()
                    .map(|leg| leg.summary.as_str())
                    .filter(|summary| !summary.is_empty())
                    .collect::<Vec<_>>()
                    .join("; ");
                let instructions = route
                    .legs
                    .iter()
                    .flat_map(|leg| leg.steps.iter())
                    .map(|step| step.maneuver.instruction.clone())
                    .filter(|instruction| !instruction.is_empty())
                    .collect();
                RouteCandidate {
                    id: RouteCandidate::id_for(PROVIDER_NAME, index),
                    provider: PROVIDER_NAME.to_owned(),
                    path: path_from_lonlat(&route.geometry.coordinates),
                    distance_meters: route.distance,
                    duration_seconds: route.duration,
                    summary,
                    instructions,
                }
            })
            .collect();
        Ok(candidates)
    }
}

#[async_trait]
impl RoutingProvider for MapboxProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn get_directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        want_alternatives: bool,
    ) -> Result<Vec<RouteCandidate>, ProviderError> {
        let url = self.directions_url(origin, destination);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("alternatives", if want_alternatives { "true" } else { "false" }),
                ("geometries", "geojson"),
                ("overview", "full"),
                ("steps", "true"),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|err| transport_error(PROVIDER_NAME, &err))?;
        check_status(PROVIDER_NAME, response.status())?;
        let payload: DirectionsResponse =
            response
                .json()
                .await
                .map_err(|err| ProviderError::Unavailable {
                    provider: PROVIDER_NAME.to_owned(),
                    message: format!("invalid response: {err}"),
                })?;
        self.convert_response(payload)
    }

    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ProviderError> {
        let response = self
            .client
            .get(self.geocode_url())
            .query(&[
                ("q", address),
                ("limit", "1"),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|err| transport_error(PROVIDER_NAME, &err))?;
        check_status(PROVIDER_NAME, response.status())?;
        let payload: GeocodeResponse =
            response
                .json()
                .await
                .map_err(|err| ProviderError::Unavailable {
                    provider: PROVIDER_NAME.to_owned(),
                    message: format!("invalid response: {err}"),
                })?;
        let Some(feature) = payload.features.first() else {
            return Ok(None);
        };
        let position = &feature.properties.coordinates;
        match Coordinate::new(position.latitude, position.longitude) {
            Ok(coordinate) => Ok(Some(coordinate)),
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn provider() -> MapboxProvider {
        MapboxProvider::new(MapboxConfig::new("pk.test-token")).expect("provider builds")
    }

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).expect("valid coordinate")
    }

    #[rstest]
    fn directions_url_targets_driving_profile(provider: MapboxProvider) {
        let url = provider.directions_url(coord(13.0827, 80.2707), coord(13.0067, 80.2206));
        assert_eq!(
            url,
            "https://api.mapbox.com/directions/v5/mapbox/driving/80.2707,13.0827;80.2206,13.0067"
        );
    }

    #[rstest]
    fn convert_response_flattens_step_instructions(provider: MapboxProvider) {
        let json = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 10250.0,
                "duration": 1380.0,
                "geometry": {"coordinates": [[80.2707, 13.0827], [80.25, 13.05], [80.2206, 13.0067]]},
                "legs": [{
                    "summary": "Anna Salai, Sardar Patel Road",
                    "steps": [
                        {"maneuver": {"instruction": "Head south on Anna Salai"}},
                        {"maneuver": {"instruction": "Turn right onto Sardar Patel Road"}}
                    ]
                }]
            }]
        }"#;
        let response: DirectionsResponse = serde_json::from_str(json).expect("deserialise");

        let candidates = provider.convert_response(response).expect("convert");

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "mapbox-0");
        assert_eq!(candidates[0].instructions.len(), 2);
        assert_eq!(candidates[0].path.len(), 3);
        assert_eq!(candidates[0].summary, "Anna Salai, Sardar Patel Road");
    }

    #[rstest]
    fn multiple_routes_get_distinct_ids(provider: MapboxProvider) {
        let json = r#"{
            "code": "Ok",
            "routes": [
                {"distance": 100.0, "duration": 60.0, "geometry": {"coordinates": []}, "legs": []},
                {"distance": 140.0, "duration": 75.0, "geometry": {"coordinates": []}, "legs": []}
            ]
        }"#;
        let response: DirectionsResponse = serde_json::from_str(json).expect("deserialise");

        let candidates = provider.convert_response(response).expect("convert");
        assert_eq!(candidates[0].id, "mapbox-0");
        assert_eq!(candidates[1].id, "mapbox-1");
    }

    #[rstest]
    fn no_segment_maps_to_no_route(provider: MapboxProvider) {
        let json = r#"{"code": "NoSegment", "message": "Could not snap coordinate"}"#;
        let response: DirectionsResponse = serde_json::from_str(json).expect("deserialise");

        let err = provider.convert_response(response).expect_err("must fail");
        assert!(matches!(err, ProviderError::NoRoute { .. }));
    }

    #[rstest]
    fn geocode_payload_parses_v6_shape() {
        let json = r#"{
            "features": [{
                "properties": {"coordinates": {"longitude": 80.2707, "latitude": 13.0827}}
            }]
        }"#;
        let payload: GeocodeResponse = serde_json::from_str(json).expect("deserialise");
        assert_eq!(payload.features.len(), 1);
        assert_eq!(payload.features[0].properties.coordinates.latitude, 13.0827);
    }
}
