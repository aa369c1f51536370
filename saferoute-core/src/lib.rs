//! Core domain types and trait seams for the SafeRoute engine.
//!
//! The crate defines the validated value types shared by every component
//! (coordinates, stops, route candidates, safety assessments), the
//! [`RoutingProvider`] and [`Recommender`] capability traits implemented by
//! satellite crates, the injectable [`Cache`] abstraction, and the
//! police-station spatial index. Constructors return `Result` so invalid
//! input is rejected before any network call is made.

#![forbid(unsafe_code)]

mod cache;
mod candidate;
mod coordinate;
mod district;
mod feedback;
mod provider;
mod recommend;
mod safety;
mod scored;
mod stations;
mod stop;

pub use cache::{Cache, MemoryCache};
pub use candidate::RouteCandidate;
pub use coordinate::{Coordinate, CoordinateError};
pub use district::{CrimeDistrictRecord, DistrictError};
pub use feedback::{FeedbackError, FeedbackRecord, FeedbackSource, FeedbackSourceError, FeedbackType};
pub use provider::{ProviderError, RoutingProvider};
pub use recommend::Recommender;
pub use safety::{LocationAssessment, RiskLevel, RouteSafety, SafetyFactor};
pub use scored::{LegResult, OptimizedRoute, ScoredCandidate};
pub use stations::{Station, StationIndex};
pub use stop::{Priority, Stop, StopError};
