use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during ephemeris calculations
#[derive(Error, Debug)]
pub enum EphemerisError {
    #[error("Ephemeris file not found at path: {path}. {message}")]
    FileNotFound { path: String, message: String },
    #[error("Invalid house system: {system}. Valid systems: {valid:?}")]
    InvalidHouseSystem { system: String, valid: Vec<String> },
    #[error("Failed to calculate position for {body} at {datetime}: {message}")]
    CalculationFailed {
        body: Body,
        datetime: DateTime<Utc>,
        message: String,
    },
    #[error("House calculation failed: {message}")]
    HouseCalculationFailed { message: String },
}

/// The ten bodies tracked for natal and transit charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Body {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl Body {
    /// Iteration order for charts and snapshot output.
    pub const ALL: [Body; 10] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Body::Sun => "sun",
            Body::Moon => "moon",
            Body::Mercury => "mercury",
            Body::Venus => "venus",
            Body::Mars => "mars",
            Body::Jupiter => "jupiter",
            Body::Saturn => "saturn",
            Body::Uranus => "uranus",
            Body::Neptune => "neptune",
            Body::Pluto => "pluto",
        }
    }

    pub fn from_name(name: &str) -> Option<Body> {
        Body::ALL
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Geographic location coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

/// Longitude and daily motion of a body at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyPosition {
    /// Longitude in degrees (0-360)
    pub longitude: f64,
    /// Speed in longitude (degrees per day)
    pub speed: f64,
}

/// House cusps and the angles derived with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseCusps {
    pub system: String,
    /// Cusps of houses 1..12, in order
    pub cusps: [f64; 12],
    pub ascendant: f64,
    pub midheaven: f64,
}

/// Source of planetary positions and house cusps.
///
/// Every call is independent; implementations must tolerate being queried
/// once per body.
pub trait EphemerisProvider: Send + Sync {
    fn position_of(&self, body: Body, instant: DateTime<Utc>) -> Result<BodyPosition, EphemerisError>;

    fn house_cusps(
        &self,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<HouseCusps, EphemerisError>;
}

impl<T: EphemerisProvider + ?Sized> EphemerisProvider for std::sync::Arc<T> {
    fn position_of(&self, body: Body, instant: DateTime<Utc>) -> Result<BodyPosition, EphemerisError> {
        (**self).position_of(body, instant)
    }

    fn house_cusps(
        &self,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<HouseCusps, EphemerisError> {
        (**self).house_cusps(instant, location)
    }
}

impl<T: EphemerisProvider + ?Sized> EphemerisProvider for Box<T> {
    fn position_of(&self, body: Body, instant: DateTime<Utc>) -> Result<BodyPosition, EphemerisError> {
        (**self).position_of(body, instant)
    }

    fn house_cusps(
        &self,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<HouseCusps, EphemerisError> {
        (**self).house_cusps(instant, location)
    }
}
