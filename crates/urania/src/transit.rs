//! Transit snapshots: where each body is now relative to a natal chart.

use crate::aspects::{Aspect, AspectDetector};
use crate::chart::{CelestialBody, NatalChart};
use crate::ephemeris::{Body, EphemerisProvider};
use crate::geometry::{house_of, Sign};
use crate::western::house_ruler;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitError {
    #[error("natal chart has no planets list")]
    MissingPlanets,
}

/// One transiting body seen against the natal chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitSnapshot {
    pub body: CelestialBody,
    pub current_sign: Sign,
    pub current_house: Option<u8>,
    pub house_ruler: Option<String>,
    pub aspects: Vec<Aspect>,
    /// Set by the relevance filter only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<i32>,
}

impl TransitSnapshot {
    pub fn has_aspects(&self) -> bool {
        !self.aspects.is_empty()
    }
}

/// Builds transit snapshots from an ephemeris provider.
pub struct TransitEngine<P> {
    provider: P,
    detector: AspectDetector,
}

impl<P: EphemerisProvider> TransitEngine<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            detector: AspectDetector::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Snapshots of all ten bodies at `instant`, in Sun..Pluto order.
    ///
    /// A body whose position lookup fails is logged and left out; only a
    /// chart without planets fails the call.
    pub fn compute_transits(
        &self,
        chart: &NatalChart,
        instant: DateTime<Utc>,
    ) -> Result<Vec<TransitSnapshot>, TransitError> {
        if chart.planets.is_none() {
            return Err(TransitError::MissingPlanets);
        }

        let mut bodies = Vec::with_capacity(Body::ALL.len());
        for body in Body::ALL {
            match self.provider.position_of(body, instant) {
                Ok(pos) => bodies.push(CelestialBody::new(body, pos.longitude, pos.speed)),
                Err(e) => log::warn!("transits: omitting {body}: {e}"),
            }
        }

        build_snapshots_with(&self.detector, &bodies, chart)
    }

    /// [`compute_transits`](Self::compute_transits) at the current instant.
    pub fn compute_transits_now(&self, chart: &NatalChart) -> Result<Vec<TransitSnapshot>, TransitError> {
        self.compute_transits(chart, Utc::now())
    }
}

/// Snapshots for already-positioned transiting bodies, preserving their order.
pub fn build_snapshots(
    bodies: &[CelestialBody],
    chart: &NatalChart,
) -> Result<Vec<TransitSnapshot>, TransitError> {
    build_snapshots_with(&AspectDetector::new(), bodies, chart)
}

fn build_snapshots_with(
    detector: &AspectDetector,
    bodies: &[CelestialBody],
    chart: &NatalChart,
) -> Result<Vec<TransitSnapshot>, TransitError> {
    let natal = chart.planets.as_deref().ok_or(TransitError::MissingPlanets)?;
    let houses = chart.house_cusps();
    if houses.is_some_and(|h| h.len() != 12) {
        log::warn!("transits: chart has malformed houses, house lookups disabled");
    }

    Ok(bodies
        .iter()
        .map(|body| {
            let current_house = house_of(body.longitude, houses);
            TransitSnapshot {
                body: *body,
                current_sign: Sign::from_longitude(body.longitude),
                current_house,
                house_ruler: house_ruler(current_house, houses),
                aspects: detector.detect_aspects(body, natal, houses),
                relevance_score: None,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspects::AspectKind;
    use crate::chart::NatalBody;

    fn chart() -> NatalChart {
        NatalChart {
            ascendant: 0.0,
            houses: Some((0..12).map(|i| i as f64 * 30.0).collect()),
            planets: Some(vec![NatalBody::at(Body::Sun, 10.0)]),
            birth: None,
        }
    }

    #[test]
    fn test_build_snapshot_fields() {
        let mars = CelestialBody::new(Body::Mars, 100.0, -0.3);
        let snaps = build_snapshots(&[mars], &chart()).unwrap();

        assert_eq!(snaps.len(), 1);
        let s = &snaps[0];
        assert!(s.body.retrograde);
        assert_eq!(s.current_sign, Sign::Cancer);
        assert_eq!(s.current_house, Some(4));
        assert_eq!(s.house_ruler.as_deref(), Some("moon"));
        assert_eq!(s.aspects.len(), 1);
        assert_eq!(s.aspects[0].kind, AspectKind::Square);
    }

    #[test]
    fn test_missing_planets_is_input_error() {
        let mut c = chart();
        c.planets = None;
        let mars = CelestialBody::new(Body::Mars, 100.0, 0.5);
        assert_eq!(build_snapshots(&[mars], &c), Err(TransitError::MissingPlanets));
    }

    #[test]
    fn test_malformed_houses_degrade_to_none() {
        let mut c = chart();
        c.houses = Some(vec![0.0, 90.0]);
        let mars = CelestialBody::new(Body::Mars, 100.0, 0.5);
        let snaps = build_snapshots(&[mars], &c).unwrap();

        assert_eq!(snaps[0].current_house, None);
        assert_eq!(snaps[0].house_ruler, None);
        assert_eq!(snaps[0].aspects[0].natal_house, None);
    }
}
