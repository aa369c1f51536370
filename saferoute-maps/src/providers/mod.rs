//! Concrete routing/geocoding backends.
//!
//! Each provider wraps one upstream service behind the
//! [`RoutingProvider`](saferoute_core::RoutingProvider) trait and translates
//! upstream failures into the three-variant
//! [`ProviderError`](saferoute_core::ProviderError) taxonomy. Providers do
//! not retry or back off; that policy belongs to the orchestrator.

mod mapbox;
mod ors;
mod osrm;

use std::time::Duration;

use reqwest::StatusCode;
use saferoute_core::{Coordinate, ProviderError};
use thiserror::Error;

pub use mapbox::{MapboxConfig, MapboxProvider};
pub use ors::{OrsConfig, OrsProvider};
pub use osrm::{OsrmConfig, OsrmProvider};

/// Default user agent for upstream requests.
pub const DEFAULT_USER_AGENT: &str = "saferoute-maps/0.1";

/// Default per-call timeout in seconds.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors raised while constructing a provider.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Building the HTTP client failed.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// The configured base URL could not be parsed.
    #[error("invalid base URL {url}")]
    InvalidBaseUrl {
        /// The offending URL string.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
}

/// Build the shared HTTP client used by every provider.
pub(crate) fn build_client(
    timeout: Duration,
    user_agent: &str,
) -> Result<reqwest::Client, ProviderBuildError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(ProviderBuildError::HttpClient)
}

/// Validate a base URL and strip any trailing slash.
pub(crate) fn canonical_base_url(base_url: &str) -> Result<String, ProviderBuildError> {
    url::Url::parse(base_url).map_err(|source| ProviderBuildError::InvalidBaseUrl {
        url: base_url.to_owned(),
        source,
    })?;
    Ok(base_url.trim_end_matches('/').to_owned())
}

/// Translate a transport-level `reqwest` error.
///
/// A timeout is indistinguishable from an unreachable upstream for fallback
/// purposes, so both map to `Unavailable`.
pub(crate) fn transport_error(provider: &str, err: &reqwest::Error) -> ProviderError {
    let message = if err.is_timeout() {
        "request timed out".to_owned()
    } else {
        err.to_string()
    };
    ProviderError::Unavailable {
        provider: provider.to_owned(),
        message,
    }
}

/// Reject non-success HTTP statuses before parsing a body.
pub(crate) fn check_status(provider: &str, status: StatusCode) -> Result<(), ProviderError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited {
            provider: provider.to_owned(),
        });
    }
    if !status.is_success() {
        return Err(ProviderError::Unavailable {
            provider: provider.to_owned(),
            message: format!("HTTP {status}"),
        });
    }
    Ok(())
}

/// Convert GeoJSON-style `[longitude, latitude]` pairs into a path.
///
/// Out-of-range points are dropped rather than failing the candidate; a
/// provider occasionally emits a junk vertex and the rest of the geometry is
/// still usable.
pub(crate) fn path_from_lonlat(coordinates: &[[f64; 2]]) -> Vec<Coordinate> {
    coordinates
        .iter()
        .filter_map(|pair| Coordinate::new(pair[1], pair[0]).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_base_url_strips_trailing_slash() {
        let url = canonical_base_url("http://router.example.com/").expect("valid URL");
        assert_eq!(url, "http://router.example.com");
    }

    #[test]
    fn canonical_base_url_rejects_garbage() {
        assert!(matches!(
            canonical_base_url("not a url"),
            Err(ProviderBuildError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn rate_limit_status_maps_to_rate_limited() {
        let err = check_status("osrm", StatusCode::TOO_MANY_REQUESTS).expect_err("must fail");
        assert!(matches!(err, ProviderError::RateLimited { .. }));
    }

    #[test]
    fn server_error_status_maps_to_unavailable() {
        let err = check_status("osrm", StatusCode::BAD_GATEWAY).expect_err("must fail");
        assert!(matches!(err, ProviderError::Unavailable { .. }));
    }

    #[test]
    fn junk_vertices_are_dropped_from_paths() {
        let path = path_from_lonlat(&[[80.27, 13.08], [999.0, 13.09], [80.28, 13.10]]);
        assert_eq!(path.len(), 2);
    }
}
