use crate::aspects::types::{Aspect, AspectKind};
use crate::chart::{CelestialBody, NatalBody};
use crate::geometry::{angular_separation, house_of, normalize, Sign};

/// Aspect detector
///
/// Matches one transiting body against every natal body using the fixed
/// orb table of [`AspectKind`].
pub struct AspectDetector;

impl AspectDetector {
    /// Create a new aspect detector
    pub fn new() -> Self {
        Self
    }

    /// Aspects from `transiting` to each natal body, in natal order.
    ///
    /// Natal bodies without a longitude are skipped.
    pub fn detect_aspects(
        &self,
        transiting: &CelestialBody,
        natal_bodies: &[NatalBody],
        houses: Option<&[f64]>,
    ) -> Vec<Aspect> {
        let mut aspects = Vec::new();

        for natal in natal_bodies {
            let Some(natal_lon) = natal.longitude else {
                log::debug!(
                    "aspect scan: natal {} has no longitude, skipped",
                    natal.name
                );
                continue;
            };

            if let Some(kind) = self.classify(transiting.longitude, natal_lon) {
                let diff = angular_separation(transiting.longitude, natal_lon);
                aspects.push(Aspect {
                    kind,
                    with_body: natal.name,
                    orb_deviation: (diff - kind.angle()).abs(),
                    applying: is_applying(
                        transiting.longitude,
                        natal_lon,
                        transiting.speed,
                        kind.angle(),
                    ),
                    natal_house: natal.house.or_else(|| house_of(natal_lon, houses)),
                    natal_sign: natal.sign.unwrap_or_else(|| Sign::from_longitude(natal_lon)),
                });
            }
        }

        aspects
    }

    /// First aspect type, in priority order, whose orb contains the
    /// separation of the two longitudes.
    pub fn classify(&self, lon1: f64, lon2: f64) -> Option<AspectKind> {
        let diff = angular_separation(lon1, lon2);
        AspectKind::PRIORITY
            .into_iter()
            .find(|kind| (diff - kind.angle()).abs() <= kind.orb())
    }
}

impl Default for AspectDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Applying/separating direction of an aspect.
///
/// The difference is taken unfolded in `[0, 360)` while `target_angle` is
/// folded, so near 180° and 360° the result can disagree with the detected
/// aspect. Stationary bodies (speed 0) take the retrograde branch.
pub fn is_applying(transit_lon: f64, natal_lon: f64, transit_speed: f64, target_angle: f64) -> bool {
    let current_diff = normalize(transit_lon - natal_lon);
    if transit_speed > 0.0 {
        current_diff < target_angle
    } else {
        current_diff > target_angle
    }
}
