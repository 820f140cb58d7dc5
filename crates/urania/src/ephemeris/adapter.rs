use crate::ephemeris::types::{
    Body, BodyPosition, EphemerisError, EphemerisProvider, GeoLocation, HouseCusps,
};
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::env;
use std::path::{Path, PathBuf};
use swisseph::swe::{calc_ut, houses_ex, julday};

/// Default location of the Swiss Ephemeris data files
pub const DEFAULT_EPHEMERIS_PATH: &str = "/usr/local/share/swisseph";

// FLG_SWIEPH | FLG_SPEED
const CALC_FLAGS: i32 = 2 | 256;

/// House system mapping
const HOUSE_SYSTEMS: &[(&str, u8)] = &[
    ("placidus", b'P'),
    ("whole_sign", b'W'),
    ("koch", b'K'),
    ("equal", b'E'),
    ("regiomontanus", b'R'),
    ("campanus", b'C'),
    ("alcabitius", b'A'),
    ("morinus", b'M'),
];

/// Swiss Ephemeris body code
fn body_code(body: Body) -> u32 {
    match body {
        Body::Sun => 0,
        Body::Moon => 1,
        Body::Mercury => 2,
        Body::Venus => 3,
        Body::Mars => 4,
        Body::Jupiter => 5,
        Body::Saturn => 6,
        Body::Uranus => 7,
        Body::Neptune => 8,
        Body::Pluto => 9,
    }
}

/// Swiss Ephemeris adapter implementation
pub struct SwissEphemerisAdapter {
    ephemeris_path: PathBuf,
    house_system: String,
    house_system_byte: u8,
}

impl SwissEphemerisAdapter {
    /// Create a new adapter with optional ephemeris path.
    ///
    /// Without an explicit path, `SWISS_EPHEMERIS_PATH` is consulted before
    /// falling back to [`DEFAULT_EPHEMERIS_PATH`].
    pub fn new(ephemeris_path: Option<PathBuf>, house_system: &str) -> Result<Self, EphemerisError> {
        let path = ephemeris_path.unwrap_or_else(|| {
            env::var("SWISS_EPHEMERIS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_EPHEMERIS_PATH))
        });

        if !path.exists() {
            return Err(EphemerisError::FileNotFound {
                path: path.display().to_string(),
                message: "Ephemeris path does not exist. Please ensure Swiss Ephemeris data files are installed.".to_string(),
            });
        }

        let house_system_byte = get_house_system_byte(house_system)?;
        log::info!(
            "Swiss Ephemeris ready at {} ({} houses)",
            path.display(),
            house_system
        );

        Ok(Self {
            ephemeris_path: path,
            house_system: house_system.to_lowercase(),
            house_system_byte,
        })
    }

    pub fn ephemeris_path(&self) -> &Path {
        &self.ephemeris_path
    }

    pub fn house_system(&self) -> &str {
        &self.house_system
    }
}

impl EphemerisProvider for SwissEphemerisAdapter {
    fn position_of(&self, body: Body, instant: DateTime<Utc>) -> Result<BodyPosition, EphemerisError> {
        let jd = datetime_to_julian_day(instant);

        let result = calc_ut(jd, body_code(body), CALC_FLAGS as u32).map_err(|e| {
            EphemerisError::CalculationFailed {
                body,
                datetime: instant,
                message: format!("Swiss Ephemeris error: {}", e),
            }
        })?;

        let out = result.out;
        if !out[0].is_finite() || !out[3].is_finite() {
            return Err(EphemerisError::CalculationFailed {
                body,
                datetime: instant,
                message: "non-finite longitude or speed".to_string(),
            });
        }

        Ok(BodyPosition {
            longitude: crate::geometry::normalize(out[0]),
            speed: out[3],
        })
    }

    fn house_cusps(
        &self,
        instant: DateTime<Utc>,
        location: GeoLocation,
    ) -> Result<HouseCusps, EphemerisError> {
        use swisseph::{AscMc, Cusp};

        let jd = datetime_to_julian_day(instant);
        let (c, a) = houses_ex(
            jd,
            CALC_FLAGS,
            location.lat,
            location.lon,
            self.house_system_byte as i32,
        );
        let cusps = Cusp::from_array(c);
        let ascmc = AscMc::from_array(a);

        let cusp_values = [
            cusps.first, cusps.second, cusps.third, cusps.fourth,
            cusps.fifth, cusps.sixth, cusps.seventh, cusps.eighth,
            cusps.ninth, cusps.tenth, cusps.eleventh, cusps.twelfth,
        ];
        if cusp_values.iter().any(|c| !c.is_finite()) {
            return Err(EphemerisError::HouseCalculationFailed {
                message: format!(
                    "non-finite cusp for {} at lat {:.4}, lon {:.4}",
                    self.house_system, location.lat, location.lon
                ),
            });
        }

        Ok(HouseCusps {
            system: self.house_system.clone(),
            cusps: cusp_values.map(crate::geometry::normalize),
            ascendant: crate::geometry::normalize(ascmc.ascendant),
            midheaven: crate::geometry::normalize(ascmc.mc),
        })
    }
}

/// Convert UTC datetime to Julian Day
pub fn datetime_to_julian_day(dt: DateTime<Utc>) -> f64 {
    let hour = dt.hour() as f64;
    let minute = dt.minute() as f64;
    let second = dt.second() as f64;
    let hour_decimal = hour + minute / 60.0 + second / 3600.0;

    // GREG_CAL = 1
    julday(dt.year(), dt.month() as i32, dt.day() as i32, hour_decimal, 1)
}

/// Convert house system string to byte format
fn get_house_system_byte(house_system: &str) -> Result<u8, EphemerisError> {
    HOUSE_SYSTEMS
        .iter()
        .find(|(name, _)| *name == house_system.to_lowercase())
        .map(|(_, byte)| *byte)
        .ok_or_else(|| EphemerisError::InvalidHouseSystem {
            system: house_system.to_string(),
            valid: HOUSE_SYSTEMS.iter().map(|(name, _)| name.to_string()).collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_house_system_lookup() {
        assert_eq!(get_house_system_byte("Placidus").unwrap(), b'P');
        assert_eq!(get_house_system_byte("whole_sign").unwrap(), b'W');
        assert!(matches!(
            get_house_system_byte("topocentric"),
            Err(EphemerisError::InvalidHouseSystem { .. })
        ));
    }

    #[test]
    fn test_missing_ephemeris_path() {
        let result = SwissEphemerisAdapter::new(
            Some(PathBuf::from("/nonexistent/swisseph/data")),
            "placidus",
        );
        assert!(matches!(result, Err(EphemerisError::FileNotFound { .. })));
    }
}
