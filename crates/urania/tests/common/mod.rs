#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use urania::chart::{NatalBody, NatalChart};
use urania::ephemeris::{
    Body, BodyPosition, EphemerisError, EphemerisProvider, GeoLocation, HouseCusps,
};

/// Ephemeris returning fixed positions; listed bodies fail on lookup.
pub struct FixedEphemeris {
    pub positions: HashMap<Body, BodyPosition>,
    pub failing: HashSet<Body>,
    pub cusps: [f64; 12],
}

impl FixedEphemeris {
    /// Every body parked where it makes no aspect to a natal Sun at 10°.
    pub fn quiet() -> Self {
        let parked = [
            (Body::Sun, 170.0),
            (Body::Moon, 175.0),
            (Body::Mercury, 180.0),
            (Body::Venus, 155.0),
            (Body::Mars, 150.0),
            (Body::Jupiter, 120.0),
            (Body::Saturn, 115.0),
            (Body::Uranus, 90.0),
            (Body::Neptune, 85.0),
            (Body::Pluto, 80.0),
        ];
        Self {
            positions: parked
                .into_iter()
                .map(|(b, lon)| (b, BodyPosition { longitude: lon, speed: 0.5 }))
                .collect(),
            failing: HashSet::new(),
            cusps: equal_cusps(),
        }
    }

    pub fn with(mut self, body: Body, longitude: f64, speed: f64) -> Self {
        self.positions.insert(body, BodyPosition { longitude, speed });
        self
    }

    pub fn failing(mut self, body: Body) -> Self {
        self.failing.insert(body);
        self
    }
}

impl EphemerisProvider for FixedEphemeris {
    fn position_of(&self, body: Body, instant: DateTime<Utc>) -> Result<BodyPosition, EphemerisError> {
        if self.failing.contains(&body) {
            return Err(EphemerisError::CalculationFailed {
                body,
                datetime: instant,
                message: "simulated failure".to_string(),
            });
        }
        self.positions
            .get(&body)
            .copied()
            .ok_or_else(|| EphemerisError::CalculationFailed {
                body,
                datetime: instant,
                message: "no fixture".to_string(),
            })
    }

    fn house_cusps(
        &self,
        _instant: DateTime<Utc>,
        _location: GeoLocation,
    ) -> Result<HouseCusps, EphemerisError> {
        Ok(HouseCusps {
            system: "equal".to_string(),
            cusps: self.cusps,
            ascendant: self.cusps[0],
            midheaven: self.cusps[9],
        })
    }
}

pub fn equal_cusps() -> [f64; 12] {
    std::array::from_fn(|i| i as f64 * 30.0)
}

/// Ascendant 0°, equal houses, natal Sun at 10°.
pub fn sun_chart() -> NatalChart {
    NatalChart {
        ascendant: 0.0,
        houses: Some(equal_cusps().to_vec()),
        planets: Some(vec![NatalBody::at(Body::Sun, 10.0)]),
        birth: None,
    }
}
