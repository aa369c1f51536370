//! Multi-stop route optimization for the SafeRoute engine.
//!
//! The [`RouteOptimizer`] is the top-level orchestrator: for each
//! consecutive leg it requests candidates from the maps orchestrator, scores
//! them with the safety scorer, combines time, safety, and distance into a
//! scalar cost per the caller's objectives, and assembles the full route.
//! Stops are visited in the order supplied by the caller; re-sequencing is
//! deliberately out of scope.

#![forbid(unsafe_code)]

mod objective;
mod optimizer;

pub use objective::{Objective, ObjectiveWeights, ParseObjectiveError};
pub use optimizer::{OptimizeError, OptimizeRequest, RiderInfo, RouteOptimizer};
