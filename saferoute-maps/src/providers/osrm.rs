//! Self-hosted OSRM backend using the Route API.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use saferoute_core::{Coordinate, ProviderError, RouteCandidate, RoutingProvider};
use serde::Deserialize;

use super::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError, build_client,
    canonical_base_url, check_status, path_from_lonlat, transport_error,
};

/// Provider name used in candidate ids, logs, and errors.
pub(crate) const PROVIDER_NAME: &str = "osrm";

/// Configuration for [`OsrmProvider`].
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Base URL of the OSRM instance (e.g. `"http://localhost:5000"`).
    pub base_url: String,
    /// Per-call request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl OsrmConfig {
    /// Create a configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
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

/// OSRM Route API response.
#[derive(Debug, Deserialize)]
pub(crate) struct RouteResponse {
    /// `"Ok"` on success, `"NoRoute"`/`"NoSegment"` when no path exists.
    pub code: String,
    /// Error detail when `code` is not `"Ok"`.
    pub message: Option<String>,
    /// Candidate routes, best first.
    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmRoute {
    pub distance: f64,
    pub duration: f64,
    pub geometry: OsrmGeometry,
    #[serde(default)]
    pub legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmGeometry {
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmLeg {
    #[serde(default)]
    pub summary: String,
}

/// Routing backend for a self-hosted OSRM instance.
///
/// OSRM ships no geocoder, so [`RoutingProvider::geocode`] always answers
/// not-found and the orchestrator falls through to the next provider.
#[derive(Debug)]
pub struct OsrmProvider {
    client: reqwest::Client,
    config: OsrmConfig,
}

impl OsrmProvider {
    /// Construct a provider.
    ///
    /// # Errors
    /// Returns [`ProviderBuildError`] when the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: OsrmConfig) -> Result<Self, ProviderBuildError> {
        let base_url = canonical_base_url(&config.base_url)?;
        let client = build_client(config.timeout, &config.user_agent)?;
        Ok(Self {
            client,
            config: OsrmConfig { base_url, ..config },
        })
    }

    fn route_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.config.base_url,
            origin.longitude(),
            origin.latitude(),
            destination.longitude(),
            destination.latitude(),
        )
    }

    fn convert_response(&self, response: RouteResponse) -> Result<Vec<RouteCandidate>, ProviderError> {
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
                    message: format!(
                        "{code}: {}",
                        response.message.unwrap_or_default()
                    ),
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
            .map(|(index, route)| RouteCandidate {
                id: RouteCandidate::id_for(PROVIDER_NAME, index),
                provider: PROVIDER_NAME.to_owned(),
                path: path_from_lonlat(&route.geometry.coordinates),
                distance_meters: route.distance,
                duration_seconds: route.duration,
                summary: route
                    .legs
                    .iter()
                    .map(|leg| leg.summary.as_str())
                    .filter(|summary| !summary.is_empty())
                    .collect::<Vec<_>>()
                    .join("; "),
                instructions: Vec::new(),
            })
            .collect();
        Ok(candidates)
    }
}

#[async_trait]
impl RoutingProvider for OsrmProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn get_directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        want_alternatives: bool,
    ) -> Result<Vec<RouteCandidate>, ProviderError> {
        let url = self.route_url(origin, destination);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("alternatives", if want_alternatives { "true" } else { "false" }),
                ("overview", "full"),
                ("geometries", "geojson"),
            ])
            .send()
            .await
            .map_err(|err| transport_error(PROVIDER_NAME, &err))?;
        check_status(PROVIDER_NAME, response.status())?;
        let payload: RouteResponse =
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
        debug!("osrm has no geocoder; {address:?} not resolvable here");
        Ok(None)
    }
}
