//! Routing providers and the fallback orchestrator.
//!
//! Three concrete [`RoutingProvider`](saferoute_core::RoutingProvider)
//! backends are provided: the Mapbox commercial API, a self-hosted OSRM
//! instance, and the OpenRouteService public API. The
//! [`MapsOrchestrator`] walks an ordered, configuration-driven list of
//! enabled providers, absorbing transient upstream failures and caching
//! geocoding results; only exhaustion crosses the component boundary.

#![forbid(unsafe_code)]

mod config;
mod orchestrator;
pub mod providers;

#[doc(hidden)]
pub mod test_support;

pub use config::{
    MapboxSettings, OrchestratorBuildError, OrsSettings, OsrmSettings, ProvidersConfig,
};
pub use orchestrator::{MapsError, MapsOrchestrator};
pub use providers::{
    MapboxConfig, MapboxProvider, OrsConfig, OrsProvider, OsrmConfig, OsrmProvider,
    ProviderBuildError,
};
