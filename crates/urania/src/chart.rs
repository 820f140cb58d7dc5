//! Chart value objects and natal chart construction.

use crate::ephemeris::{Body, EphemerisError, EphemerisProvider, GeoLocation};
use crate::geometry::{house_of, normalize, Sign};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A body's position at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    pub name: Body,
    pub longitude: f64,
    pub speed: f64,
    pub retrograde: bool,
}

impl CelestialBody {
    pub fn new(name: Body, longitude: f64, speed: f64) -> Self {
        Self {
            name,
            longitude: normalize(longitude),
            speed,
            retrograde: speed < 0.0,
        }
    }
}

/// A natal planet as stored with the chart.
///
/// Charts come from an external document store, so the longitude may be
/// missing and the house/sign may or may not have been precomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalBody {
    pub name: Body,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub retrograde: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign: Option<Sign>,
}

impl NatalBody {
    pub fn at(name: Body, longitude: f64) -> Self {
        Self {
            name,
            longitude: Some(normalize(longitude)),
            speed: 0.0,
            retrograde: false,
            house: None,
            sign: None,
        }
    }
}

/// Birth chart: ascendant, 12 house cusps and the natal planets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalChart {
    pub ascendant: f64,
    #[serde(default)]
    pub houses: Option<Vec<f64>>,
    #[serde(default)]
    pub planets: Option<Vec<NatalBody>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth: Option<BirthData>,
}

impl NatalChart {
    /// Cusps as a slice, `None` when absent.
    pub fn house_cusps(&self) -> Option<&[f64]> {
        self.houses.as_deref()
    }

    pub fn planet(&self, body: Body) -> Option<&NatalBody> {
        self.planets.as_ref()?.iter().find(|p| p.name == body)
    }
}

/// Birth moment and place a natal chart was cast for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthData {
    pub instant: DateTime<Utc>,
    pub location: GeoLocation,
    #[serde(default)]
    pub place_name: Option<String>,
}

/// Cast a natal chart: house cusps plus the ten bodies, each annotated with
/// its house and sign.
///
/// A body the provider cannot place is logged and left out; a failure to
/// compute houses fails the whole chart.
pub fn compute_natal_chart<P>(provider: &P, birth: &BirthData) -> Result<NatalChart, EphemerisError>
where
    P: EphemerisProvider + ?Sized,
{
    let cusps = provider.house_cusps(birth.instant, birth.location)?;
    let houses = cusps.cusps.to_vec();

    let mut planets = Vec::with_capacity(Body::ALL.len());
    for body in Body::ALL {
        match provider.position_of(body, birth.instant) {
            Ok(pos) => {
                let longitude = normalize(pos.longitude);
                planets.push(NatalBody {
                    name: body,
                    longitude: Some(longitude),
                    speed: pos.speed,
                    retrograde: pos.speed < 0.0,
                    house: house_of(longitude, Some(&houses)),
                    sign: Some(Sign::from_longitude(longitude)),
                });
            }
            Err(e) => log::warn!("natal chart: skipping {body}: {e}"),
        }
    }

    Ok(NatalChart {
        ascendant: cusps.ascendant,
        houses: Some(houses),
        planets: Some(planets),
        birth: Some(birth.clone()),
    })
}
