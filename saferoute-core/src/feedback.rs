//! Rider feedback records used for scoring and retraining.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Coordinate;

/// Category of a rider feedback submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    /// The rider reported the area as safe.
    Safe,
    /// The rider reported feeling unsafe.
    Unsafe,
    /// A concrete incident was reported.
    Incident,
    /// Poor street lighting was reported.
    Lighting,
}

/// A single rider feedback row.
///
/// The engine consumes these from an external collaborator; it does not
/// persist them itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFeedback", into = "RawFeedback")]
pub struct FeedbackRecord {
    /// Where the feedback applies.
    pub location: Coordinate,
    /// Rating from 1 (unsafe) to 5 (safe).
    pub rating: u8,
    /// Hour of day `[0, 23]` the experience refers to, when known.
    pub time_of_day: Option<u8>,
    /// Feedback category.
    pub feedback_type: FeedbackType,
}

/// Errors returned by [`FeedbackRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    /// Rating was outside `[1, 5]`.
    #[error("feedback rating {0} is outside the valid range [1, 5]")]
    InvalidRating(u8),
    /// Hour was outside `[0, 23]`.
    #[error("feedback hour {0} is outside the valid range [0, 23]")]
    InvalidHour(u8),
}

impl FeedbackRecord {
    /// Validate and construct a feedback record.
    ///
    /// # Errors
    /// Returns [`FeedbackError`] when the rating or hour is out of range.
    pub fn new(
        location: Coordinate,
        rating: u8,
        time_of_day: Option<u8>,
        feedback_type: FeedbackType,
    ) -> Result<Self, FeedbackError> {
        if !(1..=5).contains(&rating) {
            return Err(FeedbackError::InvalidRating(rating));
        }
        if let Some(hour) = time_of_day {
            if hour > 23 {
                return Err(FeedbackError::InvalidHour(hour));
            }
        }
        Ok(Self {
            location,
            rating,
            time_of_day,
            feedback_type,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFeedback {
    location: Coordinate,
    rating: u8,
    #[serde(default)]
    time_of_day: Option<u8>,
    feedback_type: FeedbackType,
}

impl TryFrom<RawFeedback> for FeedbackRecord {
    type Error = FeedbackError;

    fn try_from(raw: RawFeedback) -> Result<Self, Self::Error> {
        Self::new(raw.location, raw.rating, raw.time_of_day, raw.feedback_type)
    }
}

impl From<FeedbackRecord> for RawFeedback {
    fn from(record: FeedbackRecord) -> Self {
        Self {
            location: record.location,
            rating: record.rating,
            time_of_day: record.time_of_day,
            feedback_type: record.feedback_type,
        }
    }
}

/// Collaborator that supplies feedback rows on demand for retraining.
pub trait FeedbackSource: Send + Sync {
    /// Fetch all currently available feedback records.
    ///
    /// # Errors
    /// Returns [`FeedbackSourceError`] when the collaborator cannot be
    /// reached or its payload cannot be parsed.
    fn fetch_feedback(&self) -> Result<Vec<FeedbackRecord>, FeedbackSourceError>;
}

/// Failure reported by a [`FeedbackSource`].
#[derive(Debug, Error)]
#[error("feedback source unavailable: {message}")]
pub struct FeedbackSourceError {
    /// Description of the failure.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn somewhere() -> Coordinate {
        Coordinate::new(13.05, 80.25).expect("valid coordinate")
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    fn rejects_out_of_range_ratings(#[case] rating: u8) {
        let result = FeedbackRecord::new(somewhere(), rating, None, FeedbackType::Safe);
        assert_eq!(result, Err(FeedbackError::InvalidRating(rating)));
    }

    #[rstest]
    fn rejects_invalid_hour() {
        let result = FeedbackRecord::new(somewhere(), 3, Some(24), FeedbackType::Lighting);
        assert_eq!(result, Err(FeedbackError::InvalidHour(24)));
    }

    #[rstest]
    fn snake_case_feedback_types_round_trip() {
        let record = FeedbackRecord::new(somewhere(), 2, Some(22), FeedbackType::Incident)
            .expect("valid record");
        let json = serde_json::to_string(&record).expect("serialise");
        assert!(json.contains("\"incident\""));
        let back: FeedbackRecord = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, record);
    }
}
