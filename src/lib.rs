//! Facade crate for the SafeRoute routing engine.
//!
//! Re-exports the core domain types and exposes the provider orchestration,
//! safety scoring, and route optimization crates behind feature flags.

#![forbid(unsafe_code)]

pub use saferoute_core::{
    Cache, Coordinate, CoordinateError, CrimeDistrictRecord, DistrictError, FeedbackRecord,
    FeedbackType, LegResult, LocationAssessment, MemoryCache, OptimizedRoute, Priority,
    ProviderError, Recommender, RiskLevel, RouteCandidate, RouteSafety, RoutingProvider,
    SafetyFactor, ScoredCandidate, Station, StationIndex, Stop, StopError,
};

#[cfg(feature = "maps")]
pub use saferoute_maps::{MapsError, MapsOrchestrator, ProvidersConfig};

#[cfg(feature = "scorer")]
pub use saferoute_scorer::{CrimeRiskCache, RetrainError, SafetyScorer, SafetyScorerConfig};

#[cfg(feature = "optimizer")]
pub use saferoute_optimizer::{Objective, OptimizeError, OptimizeRequest, RouteOptimizer};
