//! OpenRouteService backend: directions (GeoJSON) and Pelias geocoding.
//!
//! See: <https://openrouteservice.org/dev/#/api-docs>

use std::time::Duration;

use async_trait::async_trait;
use saferoute_core::{Coordinate, ProviderError, RouteCandidate, RoutingProvider};
use serde::{Deserialize, Serialize};

use super::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError, build_client,
    canonical_base_url, check_status, path_from_lonlat, transport_error,
};

pub(crate) const PROVIDER_NAME: &str = "openrouteservice";

const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";

/// Upstream error codes meaning "reachable, but no path exists".
const NO_ROUTE_CODES: [u64; 2] = [2009, 2010];

/// How many alternative routes to request when the caller wants them.
const ALTERNATIVE_TARGET_COUNT: u32 = 3;

/// Configuration for [`OrsProvider`].
#[derive(Debug, Clone)]
pub struct OrsConfig {
    /// API key sent in the `Authorization` header.
    pub api_key: String,
    /// Base URL, overridable for self-hosted deployments.
    pub base_url: String,
    /// Per-call request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl OrsConfig {
    /// Create a configuration with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
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

#[derive(Debug, Serialize)]
struct DirectionsBody {
    coordinates: Vec<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alternative_routes: Option<AlternativeRoutes>,
}

#[derive(Debug, Serialize)]
struct AlternativeRoutes {
    target_count: u32,
}

/// GeoJSON directions response.
#[derive(Debug, Deserialize)]
pub(crate) struct DirectionsResponse {
    #[serde(default)]
    pub features: Vec<RouteFeature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteFeature {
    pub geometry: FeatureGeometry,
    pub properties: RouteProperties,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureGeometry {
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteProperties {
    pub summary: RouteSummary,
    #[serde(default)]
    pub segments: Vec<RouteSegment>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteSummary {
    pub distance: f64,
    pub duration: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteSegment {
    #[serde(default)]
    pub steps: Vec<SegmentStep>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SegmentStep {
    #[serde(default)]
    pub instruction: String,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub code: Option<u64>,
    #[serde(default)]
    pub message: String,
}

/// Pelias geocoding response.
#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    #[serde(default)]
    pub features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeFeature {
    pub geometry: FeatureGeometry,
}

/// Routing and geocoding backend for the OpenRouteService APIs.
#[derive(Debug)]
pub struct OrsProvider {
    client: reqwest::Client,
    config: OrsConfig,
}

impl OrsProvider {
    /// Construct a provider.
    ///
    /// # Errors
    /// Returns [`ProviderBuildError`] when the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: OrsConfig) -> Result<Self, ProviderBuildError> {
        let base_url = canonical_base_url(&config.base_url)?;
        let client = build_client(config.timeout, &config.user_agent)?;
        Ok(Self {
            client,
            config: OrsConfig { base_url, ..config },
        })
    }

    fn directions_url(&self) -> String {
        format!("{}/v2/directions/driving-car/geojson", self.config.base_url)
    }

    fn geocode_url(&self) -> String {
        format!("{}/geocode/search", self.config.base_url)
    }

    /// Map an upstream error body to the provider taxonomy.
    fn convert_error(status: reqwest::StatusCode, body: &str) -> ProviderError {
        if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
            if parsed
                .error
                .code
                .is_some_and(|code| NO_ROUTE_CODES.contains(&code))
            {
                return ProviderError::NoRoute {
                    provider: PROVIDER_NAME.to_owned(),
                };
            }
            return ProviderError::Unavailable {
                provider: PROVIDER_NAME.to_owned(),
                message: format!("HTTP {status}: {}", parsed.error.message),
            };
        }
        ProviderError::Unavailable {
            provider: PROVIDER_NAME.to_owned(),
            message: format!("HTTP {status}"),
        }
    }

    fn convert_response(
        &self,
        response: DirectionsResponse,
    ) -> Result<Vec<RouteCandidate>, ProviderError> {
        if response.features.is_empty() {
            return Err(ProviderError::NoRoute {
                provider: PROVIDER_NAME.to_owned(),
            });
        }
        let candidates = response
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| {
                let summary = format!(
                    "{:.1} km, {:.0} min",
                    feature.properties.summary.distance / 1_000.0,
                    feature.properties.summary.duration / 60.0,
                );
                let instructions = feature
                    .properties
                    .segments
                    .iter()
                    .flat_map(|segment| segment.steps.iter())
                    .map(|step| step.instruction.clone())
                    .filter(|instruction| !instruction.is_empty())
                    .collect();
                RouteCandidate {
                    id: RouteCandidate::id_for(PROVIDER_NAME, index),
                    provider: PROVIDER_NAME.to_owned(),
                    path: path_from_lonlat(&feature.geometry.coordinates),
                    distance_meters: feature.properties.summary.distance,
                    duration_seconds: feature.properties.summary.duration,
                    summary,
                    instructions,
                }
            })
            .collect();
        Ok(candidates)
    }
}

#[async_trait]
impl RoutingProvider for OrsProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn get_directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        want_alternatives: bool,
    ) -> Result<Vec<RouteCandidate>, ProviderError> {
        let body = DirectionsBody {
            coordinates: vec![
                [origin.longitude(), origin.latitude()],
                [destination.longitude(), destination.latitude()],
            ],
            alternative_routes: want_alternatives.then_some(AlternativeRoutes {
                target_count: ALTERNATIVE_TARGET_COUNT,
            }),
        };
        let response = self
            .client
            .post(self.directions_url())
            .header("Authorization", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error(PROVIDER_NAME, &err))?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                provider: PROVIDER_NAME.to_owned(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::convert_error(status, &body));
        }
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
                ("api_key", self.config.api_key.as_str()),
                ("text", address),
                ("size", "1"),
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
        let Some(position) = feature.geometry.coordinates.first() else {
            return Ok(None);
        };
        match Coordinate::new(position[1], position[0]) {
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
    fn provider() -> OrsProvider {
        OrsProvider::new(OrsConfig::new("test-key")).expect("provider builds")
    }

    #[rstest]
    fn directions_url_targets_geojson_endpoint(provider: OrsProvider) {
        assert_eq!(
            provider.directions_url(),
            "https://api.openrouteservice.org/v2/directions/driving-car/geojson"
        );
    }

    #[rstest]
    fn convert_response_reads_geojson_features(provider: OrsProvider) {
        let json = r#"{
            "features": [{
                "geometry": {"coordinates": [[80.2707, 13.0827], [80.2206, 13.0067]]},
                "properties": {
                    "summary": {"distance": 9800.0, "duration": 1500.0},
                    "segments": [{"steps": [{"instruction": "Head south"}]}]
                }
            }]
        }"#;
        let response: DirectionsResponse = serde_json::from_str(json).expect("deserialise");

        let candidates = provider.convert_response(response).expect("convert");

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "openrouteservice-0");
        assert_eq!(candidates[0].duration_seconds, 1500.0);
        assert_eq!(candidates[0].instructions, vec!["Head south".to_owned()]);
        assert_eq!(candidates[0].summary, "9.8 km, 25 min");
    }

    #[rstest]
    fn empty_feature_list_maps_to_no_route(provider: OrsProvider) {
        let response: DirectionsResponse =
            serde_json::from_str(r#"{"features": []}"#).expect("deserialise");
        let err = provider.convert_response(response).expect_err("must fail");
        assert!(matches!(err, ProviderError::NoRoute { .. }));
    }

    #[rstest]
    fn route_not_found_error_code_maps_to_no_route() {
        let body = r#"{"error": {"code": 2009, "message": "Route could not be found"}}"#;
        let err = OrsProvider::convert_error(reqwest::StatusCode::NOT_FOUND, body);
        assert!(matches!(err, ProviderError::NoRoute { .. }));
    }

    #[rstest]
    fn other_error_codes_map_to_unavailable() {
        let body = r#"{"error": {"code": 2003, "message": "Parameter out of range"}}"#;
        let err = OrsProvider::convert_error(reqwest::StatusCode::BAD_REQUEST, body);
        match err {
            ProviderError::Unavailable { message, .. } => {
                assert!(message.contains("Parameter out of range"));
            }
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[rstest]
    fn unparsable_error_bodies_still_map_to_unavailable() {
        let err = OrsProvider::convert_error(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(matches!(err, ProviderError::Unavailable { .. }));
    }

    #[rstest]
    fn geocode_payload_parses_pelias_shape() {
        let json = r#"{
            "features": [{"geometry": {"coordinates": [[80.2707, 13.0827]]}}]
        }"#;
        let payload: GeocodeResponse = serde_json::from_str(json).expect("deserialise");
        assert_eq!(payload.features[0].geometry.coordinates[0], [80.2707, 13.0827]);
    }
}
