//! Latitude/longitude pair with great-circle distance.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Mean Earth radius used by every distance calculation.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A validated point on the Earth's surface, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting latitudes outside [-90, 90], longitudes
    /// outside [-180, 180] and non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in meters (haversine).
    ///
    /// Exactly 0 for identical points and symmetric in its arguments.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let phi1 = self.latitude.to_radians();
        let phi2 = other.latitude.to_radians();
        let delta_phi = (other.latitude - self.latitude).to_radians();
        let delta_lambda = (other.longitude - self.longitude).to_radians();

        let sin_phi = (delta_phi / 2.0).sin();
        let sin_lambda = (delta_lambda / 2.0).sin();
        let a = sin_phi * sin_phi + phi1.cos() * phi2.cos() * sin_lambda * sin_lambda;
        // Rounding can push `a` a hair past 1 for antipodal points.
        let a = a.clamp(0.0, 1.0);

        2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Great-circle distance in kilometres.
    pub fn distance_to_km(&self, other: &GeoPoint) -> f64 {
        self.distance_to(other) / 1000.0
    }

    /// True if `other` lies within `radius_m` meters, boundary included.
    pub fn is_within(&self, other: &GeoPoint, radius_m: f64) -> bool {
        self.distance_to(other) <= radius_m
    }
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = ValidationError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}
