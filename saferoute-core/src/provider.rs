//! The routing provider capability implemented by concrete backends.

use async_trait::async_trait;
use thiserror::Error;

use crate::{Coordinate, RouteCandidate};

/// Failure modes a provider must translate upstream errors into.
///
/// Providers never retry or back off themselves; the orchestrator owns the
/// fallback policy and treats every variant as "advance to the next
/// provider".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Network, authentication, or timeout failure.
    #[error("provider {provider} is unavailable: {message}")]
    Unavailable {
        /// Provider that failed.
        provider: String,
        /// Upstream failure description.
        message: String,
    },
    /// The upstream service throttled the request.
    #[error("provider {provider} rate limited the request")]
    RateLimited {
        /// Provider that throttled.
        provider: String,
    },
    /// The call was valid but no path exists between the points.
    #[error("provider {provider} found no route")]
    NoRoute {
        /// Provider that answered.
        provider: String,
    },
}

impl ProviderError {
    /// Name of the provider the error originated from.
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::Unavailable { provider, .. }
            | Self::RateLimited { provider }
            | Self::NoRoute { provider } => provider,
        }
    }
}

/// A routing/geocoding backend.
///
/// Each implementation wraps one upstream source and is configured with its
/// own credentials and endpoint. Implementations must be `Send + Sync` so a
/// single instance can serve concurrent requests.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Stable provider name used in candidate ids, logs, and errors.
    fn name(&self) -> &str;

    /// Fetch one or more candidate paths between two points.
    ///
    /// Returns at least one candidate on success; `want_alternatives` asks
    /// the upstream for additional paths where supported.
    ///
    /// # Errors
    /// Returns [`ProviderError`] with upstream failures translated into the
    /// three-variant taxonomy.
    async fn get_directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        want_alternatives: bool,
    ) -> Result<Vec<RouteCandidate>, ProviderError>;

    /// Resolve a free-text address to a coordinate.
    ///
    /// `Ok(None)` means the provider answered but knows no such address.
    ///
    /// # Errors
    /// Returns [`ProviderError`] when the upstream call fails.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, ProviderError>;
}
