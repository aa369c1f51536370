//! Geographic coordinates with range-validated construction.

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A WGS84 latitude/longitude pair.
///
/// Construction fails outside the valid ranges, so a `Coordinate` held
/// anywhere in the engine is known to be on the globe. The type is an
/// immutable `Copy` value.
///
/// # Examples
/// ```
/// use saferoute_core::Coordinate;
///
/// let chennai = Coordinate::new(13.0827, 80.2707)?;
/// assert_eq!(chennai.latitude(), 13.0827);
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// # Ok::<(), saferoute_core::CoordinateError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

/// Errors returned by [`Coordinate::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude was outside `[-90, 90]` or not finite.
    #[error("latitude {0} is outside the valid range [-90, 90]")]
    InvalidLatitude(f64),
    /// Longitude was outside `[-180, 180]` or not finite.
    #[error("longitude {0} is outside the valid range [-180, 180]")]
    InvalidLongitude(f64),
}

impl Coordinate {
    /// Validate and construct a coordinate.
    ///
    /// # Errors
    /// Returns [`CoordinateError`] when either component is out of range or
    /// non-finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to `other` in metres.
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let here = Point::new(self.longitude, self.latitude);
        let there = Point::new(other.longitude, other.latitude);
        here.haversine_distance(&there)
    }
}

/// Wire representation used to validate deserialized coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(coordinate: Coordinate) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        }
    }
}
