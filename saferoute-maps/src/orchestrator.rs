//! Ordered provider fallback with geocode caching.

use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};
use saferoute_core::{Cache, Coordinate, MemoryCache, RouteCandidate, RoutingProvider};
use thiserror::Error;

/// Failures surfaced by the orchestrator once every provider is exhausted.
///
/// Transient per-provider failures never cross this boundary; only
/// exhaustion does, carrying one attempt summary per provider tried so the
/// caller can see exactly what failed.
#[derive(Debug, Error)]
pub enum MapsError {
    /// Every provider failed or returned no candidates for a directions
    /// request.
    #[error("all routing providers failed: [{}]", attempts.join("; "))]
    RoutingUnavailable {
        /// One summary per provider attempt.
        attempts: Vec<String>,
    },
    /// Every provider failed for a geocoding request.
    #[error("all geocoding providers failed: [{}]", attempts.join("; "))]
    GeocodingUnavailable {
        /// One summary per provider attempt.
        attempts: Vec<String>,
    },
}

/// Walks an ordered list of enabled providers and normalizes their output.
///
/// Fallback policy: `Unavailable`, `RateLimited`, and `NoRoute` all advance
/// to the next provider (a reachable but route-less provider does not
/// disqualify a better-positioned one); the first provider returning a
/// non-empty candidate list wins. Successful geocodes are cached forever
/// under a case/whitespace-normalized address key.
///
/// The optional race mode fires every provider concurrently and accepts the
/// first success. It trades upstream request volume for latency and is never
/// the default.
pub struct MapsOrchestrator {
    providers: Vec<Arc<dyn RoutingProvider>>,
    geocode_cache: MemoryCache<String, Coordinate>,
    race: bool,
}

impl std::fmt::Debug for MapsOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapsOrchestrator")
            .field("providers", &self.provider_names())
            .field("race", &self.race)
            .finish_non_exhaustive()
    }
}

impl MapsOrchestrator {
    /// Build an orchestrator over an ordered provider list.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn RoutingProvider>>) -> Self {
        Self {
            providers,
            geocode_cache: MemoryCache::new(),
            race: false,
        }
    }

    /// Enable or disable the parallel provider race.
    #[must_use]
    pub fn with_race(mut self, race: bool) -> Self {
        self.race = race;
        self
    }

    /// Names of the enabled providers, in fallback order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Number of cached geocoding results.
    #[must_use]
    pub fn geocode_cache_len(&self) -> usize {
        self.geocode_cache.len()
    }

    /// Canonical cache key for an address: lowercased, whitespace collapsed.
    ///
    /// # Examples
    /// ```
    /// use saferoute_maps::MapsOrchestrator;
    ///
    /// let key = MapsOrchestrator::canonical_address_key("  12  Anna   Salai ");
    /// assert_eq!(key, "12 anna salai");
    /// ```
    #[must_use]
    pub fn canonical_address_key(address: &str) -> String {
        address
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Fetch candidate paths for one leg, falling back across providers.
    ///
    /// # Errors
    /// Returns [`MapsError::RoutingUnavailable`] when every provider is
    /// exhausted.
    pub async fn get_directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        want_alternatives: bool,
    ) -> Result<Vec<RouteCandidate>, MapsError> {
        if self.race {
            return self
                .race_directions(origin, destination, want_alternatives)
                .await;
        }

        let mut attempts = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            match provider
                .get_directions(origin, destination, want_alternatives)
                .await
            {
                Ok(candidates) if !candidates.is_empty() => {
                    debug!(
                        "provider {} returned {} candidate(s)",
                        provider.name(),
                        candidates.len()
                    );
                    return Ok(candidates);
                }
                Ok(_) => {
                    warn!(
                        "provider {} returned no candidates; trying next",
                        provider.name()
                    );
                    attempts.push(format!("{}: empty candidate list", provider.name()));
                }
                Err(err) => {
                    warn!("provider {} failed: {err}; trying next", provider.name());
                    attempts.push(err.to_string());
                }
            }
        }
        Err(MapsError::RoutingUnavailable { attempts })
    }

    /// Race every provider for the same leg, accepting the first success.
    async fn race_directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        want_alternatives: bool,
    ) -> Result<Vec<RouteCandidate>, MapsError> {
        let mut in_flight: FuturesUnordered<_> = self
            .providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                async move {
                    let result = provider
                        .get_directions(origin, destination, want_alternatives)
                        .await;
                    (provider.name().to_owned(), result)
                }
            })
            .collect();

        let mut attempts = Vec::with_capacity(self.providers.len());
        while let Some((name, result)) = in_flight.next().await {
            match result {
                Ok(candidates) if !candidates.is_empty() => {
                    debug!("provider {name} won the race with {} candidate(s)", candidates.len());
                    return Ok(candidates);
                }
                Ok(_) => attempts.push(format!("{name}: empty candidate list")),
                Err(err) => {
                    warn!("provider {name} lost the race: {err}");
                    attempts.push(err.to_string());
                }
            }
        }
        Err(MapsError::RoutingUnavailable { attempts })
    }

    /// Resolve an address, falling back across providers.
    ///
    /// Successful results are cached unboundedly: a coordinate for a fixed
    /// address string is treated as an immutable fact. `Ok(None)` means at
    /// least one provider answered and none knows the address.
    ///
    /// # Errors
    /// Returns [`MapsError::GeocodingUnavailable`] when every provider
    /// failed outright.
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, MapsError> {
        let key = Self::canonical_address_key(address);
        if let Some(hit) = self.geocode_cache.get(&key) {
            debug!("geocode cache hit for {key:?}");
            return Ok(Some(hit));
        }

        let mut attempts = Vec::with_capacity(self.providers.len());
        let mut any_answered = false;
        for provider in &self.providers {
            match provider.geocode(address).await {
                Ok(Some(coordinate)) => {
                    self.geocode_cache.put(key, coordinate);
                    return Ok(Some(coordinate));
                }
                Ok(None) => {
                    any_answered = true;
                    attempts.push(format!("{}: address not found", provider.name()));
                }
                Err(err) => {
                    warn!("provider {} geocode failed: {err}; trying next", provider.name());
                    attempts.push(err.to_string());
                }
            }
        }
        if any_answered {
            Ok(None)
        } else {
            Err(MapsError::GeocodingUnavailable { attempts })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubRoutingProvider, candidate_between};
    use rstest::rstest;
    use saferoute_core::ProviderError;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).expect("valid coordinate")
    }

    fn origin() -> Coordinate {
        coord(13.0827, 80.2707)
    }

    fn destination() -> Coordinate {
        coord(13.0067, 80.2206)
    }

    fn unavailable(provider: &str) -> ProviderError {
        ProviderError::Unavailable {
            provider: provider.to_owned(),
            message: "connection refused".to_owned(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn first_successful_provider_wins_and_later_ones_are_not_called() {
        let failing = Arc::new(StubRoutingProvider::with_directions_error(
            "alpha",
            unavailable("alpha"),
        ));
        let succeeding = Arc::new(StubRoutingProvider::with_candidates(
            "bravo",
            vec![candidate_between("bravo", 0, origin(), destination(), 9_000.0, 1_200.0)],
        ));
        let untouched = Arc::new(StubRoutingProvider::with_candidates(
            "charlie",
            vec![candidate_between("charlie", 0, origin(), destination(), 8_000.0, 1_100.0)],
        ));
        let orchestrator = MapsOrchestrator::new(vec![
            failing.clone(),
            succeeding.clone(),
            untouched.clone(),
        ]);

        let candidates = orchestrator
            .get_directions(origin(), destination(), true)
            .await
            .expect("bravo succeeds");

        assert_eq!(candidates[0].provider, "bravo");
        assert_eq!(failing.directions_calls(), 1);
        assert_eq!(succeeding.directions_calls(), 1);
        assert_eq!(untouched.directions_calls(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn no_route_advances_to_the_next_provider() {
        let routeless = Arc::new(StubRoutingProvider::with_directions_error(
            "alpha",
            ProviderError::NoRoute {
                provider: "alpha".to_owned(),
            },
        ));
        let succeeding = Arc::new(StubRoutingProvider::with_candidates(
            "bravo",
            vec![candidate_between("bravo", 0, origin(), destination(), 9_000.0, 1_200.0)],
        ));
        let orchestrator = MapsOrchestrator::new(vec![routeless, succeeding]);

        let candidates = orchestrator
            .get_directions(origin(), destination(), false)
            .await
            .expect("bravo succeeds");
        assert_eq!(candidates[0].provider, "bravo");
    }

    #[rstest]
    #[tokio::test]
    async fn empty_candidate_lists_advance_too() {
        let empty = Arc::new(StubRoutingProvider::with_candidates("alpha", Vec::new()));
        let succeeding = Arc::new(StubRoutingProvider::with_candidates(
            "bravo",
            vec![candidate_between("bravo", 0, origin(), destination(), 9_000.0, 1_200.0)],
        ));
        let orchestrator = MapsOrchestrator::new(vec![empty, succeeding]);

        let candidates = orchestrator
            .get_directions(origin(), destination(), false)
            .await
            .expect("bravo succeeds");
        assert_eq!(candidates[0].provider, "bravo");
    }

    #[rstest]
    #[tokio::test]
    async fn exhaustion_reports_every_attempt() {
        let orchestrator = MapsOrchestrator::new(vec![
            Arc::new(StubRoutingProvider::with_directions_error(
                "alpha",
                unavailable("alpha"),
            )),
            Arc::new(StubRoutingProvider::with_directions_error(
                "bravo",
                ProviderError::RateLimited {
                    provider: "bravo".to_owned(),
                },
            )),
        ]);

        let err = orchestrator
            .get_directions(origin(), destination(), true)
            .await
            .expect_err("both providers fail");

        match err {
            MapsError::RoutingUnavailable { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].contains("alpha"));
                assert!(attempts[1].contains("bravo"));
            }
            other => panic!("expected RoutingUnavailable, got {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn race_mode_accepts_a_success_despite_failures() {
        let orchestrator = MapsOrchestrator::new(vec![
            Arc::new(StubRoutingProvider::with_directions_error(
                "alpha",
                unavailable("alpha"),
            )),
            Arc::new(StubRoutingProvider::with_candidates(
                "bravo",
                vec![candidate_between("bravo", 0, origin(), destination(), 9_000.0, 1_200.0)],
            )),
        ])
        .with_race(true);

        let candidates = orchestrator
            .get_directions(origin(), destination(), true)
            .await
            .expect("bravo succeeds");
        assert_eq!(candidates[0].provider, "bravo");
    }

    #[rstest]
    #[tokio::test]
    async fn race_mode_still_fails_on_exhaustion() {
        let orchestrator = MapsOrchestrator::new(vec![Arc::new(
            StubRoutingProvider::with_directions_error("alpha", unavailable("alpha")),
        )])
        .with_race(true);

        let err = orchestrator
            .get_directions(origin(), destination(), true)
            .await
            .expect_err("must fail");
        assert!(matches!(err, MapsError::RoutingUnavailable { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn geocode_results_are_cached_by_canonical_key() {
        let provider = Arc::new(StubRoutingProvider::with_geocode(
            "alpha",
            Some(coord(13.0827, 80.2707)),
        ));
        let orchestrator = MapsOrchestrator::new(vec![provider.clone()]);

        let first = orchestrator
            .geocode("  Chennai   Central ")
            .await
            .expect("resolves");
        let second = orchestrator
            .geocode("chennai central")
            .await
            .expect("resolves");

        assert_eq!(first, second);
        assert_eq!(provider.geocode_calls(), 1);
        assert_eq!(orchestrator.geocode_cache_len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn geocode_falls_back_then_reports_not_found() {
        let erroring = Arc::new(StubRoutingProvider::with_geocode_error(
            "alpha",
            unavailable("alpha"),
        ));
        let answering = Arc::new(StubRoutingProvider::with_geocode("bravo", None));
        let orchestrator = MapsOrchestrator::new(vec![erroring, answering]);

        let result = orchestrator.geocode("Nowhere Street").await.expect("answered");
        assert!(result.is_none());
        assert_eq!(orchestrator.geocode_cache_len(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn geocode_errors_when_no_provider_answers() {
        let orchestrator = MapsOrchestrator::new(vec![Arc::new(
            StubRoutingProvider::with_geocode_error("alpha", unavailable("alpha")),
        )]);

        let err = orchestrator
            .geocode("Chennai Central")
            .await
            .expect_err("must fail");
        assert!(matches!(err, MapsError::GeocodingUnavailable { .. }));
    }
}
