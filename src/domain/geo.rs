//! Geo - Validated Coordinates

use snafu::{Snafu, ensure};

/// Reasons a coordinate pair is rejected
#[derive(Debug, Clone, PartialEq, Snafu)]
pub enum CoordinateError {
    #[snafu(display("latitude {lat} is not within [-90, 90]"))]
    LatitudeOutOfRange { lat: f64 },

    #[snafu(display("longitude {lng} is not within [-180, 180]"))]
    LongitudeOutOfRange { lng: f64 },
}

/// An immutable latitude/longitude pair in degrees
///
/// Only constructible through [`LatLng::new`], so every value in circulation
/// satisfies `lat ∈ [-90, 90]` and `lng ∈ [-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    lat: f64,
    lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        // NaN fails both range checks
        ensure!(
            (-90.0..=90.0).contains(&lat),
            LatitudeOutOfRangeSnafu { lat }
        );
        ensure!(
            (-180.0..=180.0).contains(&lng),
            LongitudeOutOfRangeSnafu { lng }
        );
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}
