//! Delivery stops supplied by the caller of an optimization request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Coordinate;

/// Relative urgency of a stop, carried through to the assembled route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Deliver when convenient.
    Low,
    /// Standard delivery.
    #[default]
    Normal,
    /// Time-sensitive delivery.
    High,
}

/// A single stop within a multi-stop route.
///
/// Stops are created by the caller and immutable for the duration of one
/// optimization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Caller-assigned identifier, unique within one request.
    pub id: String,
    /// Validated geographic position.
    pub coordinate: Coordinate,
    /// Free-text address for display and logging.
    pub address: String,
    /// Urgency tag.
    pub priority: Priority,
}

/// Errors returned by [`Stop::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StopError {
    /// The identifier was empty or whitespace.
    #[error("stop identifier must not be empty")]
    EmptyId,
}

impl Stop {
    /// Validate and construct a stop.
    ///
    /// # Errors
    /// Returns [`StopError::EmptyId`] when `id` is empty or whitespace.
    pub fn new(
        id: impl Into<String>,
        coordinate: Coordinate,
        address: impl Into<String>,
        priority: Priority,
    ) -> Result<Self, StopError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(StopError::EmptyId);
        }
        Ok(Self {
            id,
            coordinate,
            address: address.into(),
            priority,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn anywhere() -> Coordinate {
        Coordinate::new(13.0, 80.0).expect("valid coordinate")
    }

    #[rstest]
    fn constructs_with_default_priority_serialisation() {
        let stop = Stop::new("s1", anywhere(), "1 Example Road", Priority::default())
            .expect("valid stop");
        let json = serde_json::to_string(&stop).expect("serialise");
        assert!(json.contains("\"normal\""));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn rejects_blank_identifiers(#[case] id: &str) {
        let result = Stop::new(id, anywhere(), "somewhere", Priority::Normal);
        assert_eq!(result, Err(StopError::EmptyId));
    }
}
