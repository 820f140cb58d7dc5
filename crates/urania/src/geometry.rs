//! Angular helpers shared by the aspect detector, the snapshot builder and
//! the prompt renderer.
//!
//! All longitudes are ecliptic degrees. Inputs may be any finite value;
//! outputs are folded into the canonical ranges documented per function.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Zodiac signs in ecliptic order, Aries at 0°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl Sign {
    pub const ALL: [Sign; 12] = [
        Sign::Aries,
        Sign::Taurus,
        Sign::Gemini,
        Sign::Cancer,
        Sign::Leo,
        Sign::Virgo,
        Sign::Libra,
        Sign::Scorpio,
        Sign::Sagittarius,
        Sign::Capricorn,
        Sign::Aquarius,
        Sign::Pisces,
    ];

    /// Sign for an index; wraps modulo 12.
    pub fn from_index(index: usize) -> Sign {
        Sign::ALL[index % 12]
    }

    /// Sign containing a longitude.
    pub fn from_longitude(longitude: f64) -> Sign {
        Sign::from_index(sign_index(longitude))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Sign::Aries => "aries",
            Sign::Taurus => "taurus",
            Sign::Gemini => "gemini",
            Sign::Cancer => "cancer",
            Sign::Leo => "leo",
            Sign::Virgo => "virgo",
            Sign::Libra => "libra",
            Sign::Scorpio => "scorpio",
            Sign::Sagittarius => "sagittarius",
            Sign::Capricorn => "capricorn",
            Sign::Aquarius => "aquarius",
            Sign::Pisces => "pisces",
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fold an angle into `[0, 360)`.
pub fn normalize(angle: f64) -> f64 {
    let folded = ((angle % 360.0) + 360.0) % 360.0;
    // -1e-15 % 360 + 360 rounds up to exactly 360.0
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

/// Get sign index (0-11) from longitude
pub fn sign_index(angle: f64) -> usize {
    ((normalize(angle) / 30.0).floor() as usize).min(11)
}

/// House number (1-12) whose sector contains `longitude`.
///
/// Sector `i` spans `houses[i]` up to (not including) `houses[(i + 1) % 12]`;
/// a sector whose start is not below its end crosses 0° and matches on
/// either side of it. The first matching sector wins. Returns `None` unless
/// exactly 12 cusps are supplied.
pub fn house_of(longitude: f64, houses: Option<&[f64]>) -> Option<u8> {
    let houses = houses?;
    if houses.len() != 12 {
        return None;
    }

    for i in 0..12 {
        let start = houses[i];
        let end = houses[(i + 1) % 12];
        let inside = if start < end {
            longitude >= start && longitude < end
        } else {
            longitude >= start || longitude < end
        };
        if inside {
            return Some((i + 1) as u8);
        }
    }

    None
}

/// Shortest angular distance between two longitudes, in `[0, 180]`.
pub fn angular_separation(a: f64, b: f64) -> f64 {
    let d = (normalize(a) - normalize(b)).abs();
    if d > 180.0 {
        360.0 - d
    } else {
        d
    }
}

/// Whole degrees and arc-minutes of a longitude within its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeMinute {
    pub degree: u8,
    pub minutes: u8,
}

impl DegreeMinute {
    pub fn from_longitude(longitude: f64) -> Self {
        let in_sign = normalize(longitude) % 30.0;
        let degree = in_sign.floor();
        let minutes = ((in_sign - degree) * 60.0).floor();
        Self {
            degree: degree as u8,
            minutes: (minutes as u8).min(59),
        }
    }
}

impl fmt::Display for DegreeMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°{:02}'", self.degree, self.minutes)
    }
}
