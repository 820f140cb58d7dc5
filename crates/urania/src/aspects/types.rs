use crate::ephemeris::Body;
use crate::geometry::Sign;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aspect types, declared in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AspectKind {
    Conjunction,
    SemiSextile,
    SemiSquare,
    Sextile,
    Square,
    Trine,
    Sesquiquadrate,
    Quincunx,
    Opposition,
}

impl AspectKind {
    /// Order in which angle differences are tested; the first hit wins.
    pub const PRIORITY: [AspectKind; 9] = [
        AspectKind::Conjunction,
        AspectKind::SemiSextile,
        AspectKind::SemiSquare,
        AspectKind::Sextile,
        AspectKind::Square,
        AspectKind::Trine,
        AspectKind::Sesquiquadrate,
        AspectKind::Quincunx,
        AspectKind::Opposition,
    ];

    /// Exact angle of the aspect in degrees.
    pub fn angle(self) -> f64 {
        match self {
            AspectKind::Conjunction => 0.0,
            AspectKind::SemiSextile => 30.0,
            AspectKind::SemiSquare => 45.0,
            AspectKind::Sextile => 60.0,
            AspectKind::Square => 90.0,
            AspectKind::Trine => 120.0,
            AspectKind::Sesquiquadrate => 135.0,
            AspectKind::Quincunx => 150.0,
            AspectKind::Opposition => 180.0,
        }
    }

    /// Allowed deviation from the exact angle.
    pub fn orb(self) -> f64 {
        match self {
            AspectKind::Conjunction
            | AspectKind::Square
            | AspectKind::Trine
            | AspectKind::Opposition => 8.0,
            AspectKind::Sextile => 6.0,
            AspectKind::SemiSextile
            | AspectKind::SemiSquare
            | AspectKind::Sesquiquadrate
            | AspectKind::Quincunx => 3.0,
        }
    }

    /// Conjunction, square, trine and opposition.
    pub fn is_major(self) -> bool {
        matches!(
            self,
            AspectKind::Conjunction | AspectKind::Square | AspectKind::Trine | AspectKind::Opposition
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            AspectKind::Conjunction => "conjunction",
            AspectKind::SemiSextile => "semi-sextile",
            AspectKind::SemiSquare => "semi-square",
            AspectKind::Sextile => "sextile",
            AspectKind::Square => "square",
            AspectKind::Trine => "trine",
            AspectKind::Sesquiquadrate => "sesquiquadrate",
            AspectKind::Quincunx => "quincunx",
            AspectKind::Opposition => "opposition",
        }
    }
}

impl fmt::Display for AspectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aspect from a transiting body to one natal body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aspect {
    #[serde(rename = "type")]
    pub kind: AspectKind,
    pub with_body: Body,
    /// Deviation from the exact angle, in degrees
    pub orb_deviation: f64,
    /// Whether the aspect is applying (approaching exact)
    pub applying: bool,
    pub natal_house: Option<u8>,
    pub natal_sign: Sign,
}
