mod common;

use chrono::{TimeZone, Utc};
use common::{sun_chart, FixedEphemeris};
use urania::aspects::AspectKind;
use urania::chart::{compute_natal_chart, BirthData};
use urania::ephemeris::{Body, GeoLocation};
use urania::geometry::Sign;
use urania::transit::{TransitEngine, TransitError};

fn instant() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
}

#[test]
fn test_mars_square_natal_sun() {
    let engine = TransitEngine::new(FixedEphemeris::quiet().with(Body::Mars, 100.0, 0.6));

    let snapshots = engine.compute_transits(&sun_chart(), instant()).unwrap();

    let mars = snapshots.iter().find(|s| s.body.name == Body::Mars).unwrap();
    assert_eq!(mars.aspects.len(), 1);
    assert_eq!(mars.aspects[0].kind, AspectKind::Square);
    assert_eq!(mars.aspects[0].with_body, Body::Sun);
    assert_eq!(mars.aspects[0].orb_deviation, 0.0);
    assert_eq!(mars.current_house, Some(4));
    assert_eq!(mars.current_sign, Sign::Cancer);

    // Parked bodies make no aspects
    assert!(snapshots
        .iter()
        .filter(|s| s.body.name != Body::Mars)
        .all(|s| s.aspects.is_empty()));
}

#[test]
fn test_output_order_is_fixed() {
    let engine = TransitEngine::new(FixedEphemeris::quiet());

    let snapshots = engine.compute_transits(&sun_chart(), instant()).unwrap();

    let order: Vec<Body> = snapshots.iter().map(|s| s.body.name).collect();
    assert_eq!(order, Body::ALL.to_vec());
}

#[test]
fn test_failing_body_is_omitted() {
    let engine = TransitEngine::new(FixedEphemeris::quiet().failing(Body::Venus));

    let snapshots = engine.compute_transits(&sun_chart(), instant()).unwrap();

    assert_eq!(snapshots.len(), 9);
    let order: Vec<Body> = snapshots.iter().map(|s| s.body.name).collect();
    let expected: Vec<Body> = Body::ALL.into_iter().filter(|b| *b != Body::Venus).collect();
    assert_eq!(order, expected);
}

#[test]
fn test_chart_without_planets_fails() {
    let engine = TransitEngine::new(FixedEphemeris::quiet());
    let mut chart = sun_chart();
    chart.planets = None;

    assert_eq!(
        engine.compute_transits(&chart, instant()),
        Err(TransitError::MissingPlanets)
    );
}

#[test]
fn test_missing_houses_yield_unknown_house() {
    let engine = TransitEngine::new(FixedEphemeris::quiet().with(Body::Mars, 100.0, 0.6));
    let mut chart = sun_chart();
    chart.houses = None;

    let snapshots = engine.compute_transits(&chart, instant()).unwrap();

    assert!(snapshots.iter().all(|s| s.current_house.is_none() && s.house_ruler.is_none()));
    let mars = snapshots.iter().find(|s| s.body.name == Body::Mars).unwrap();
    assert_eq!(mars.aspects[0].natal_house, None);
}

#[test]
fn test_retrograde_flag_follows_speed() {
    let engine = TransitEngine::new(FixedEphemeris::quiet().with(Body::Mercury, 180.0, -0.4));

    let snapshots = engine.compute_transits(&sun_chart(), instant()).unwrap();

    let mercury = snapshots.iter().find(|s| s.body.name == Body::Mercury).unwrap();
    assert!(mercury.body.retrograde);
    assert!(snapshots.iter().filter(|s| s.body.name != Body::Mercury).all(|s| !s.body.retrograde));
}

#[test]
fn test_compute_natal_chart_annotates_planets() {
    let provider = FixedEphemeris::quiet().failing(Body::Pluto);
    let birth = BirthData {
        instant: instant(),
        location: GeoLocation { lat: 48.85, lon: 2.35 },
        place_name: Some("Paris".to_string()),
    };

    let chart = compute_natal_chart(&provider, &birth).unwrap();

    let planets = chart.planets.as_ref().unwrap();
    assert_eq!(planets.len(), 9);
    let sun = chart.planet(Body::Sun).unwrap();
    assert_eq!(sun.longitude, Some(170.0));
    assert_eq!(sun.house, Some(6));
    assert_eq!(sun.sign, Some(Sign::Virgo));
    assert_eq!(chart.houses.as_ref().map(Vec::len), Some(12));
    assert_eq!(chart.birth.as_ref().and_then(|b| b.place_name.as_deref()), Some("Paris"));
}

#[test]
fn test_snapshot_json_shape() {
    let engine = TransitEngine::new(FixedEphemeris::quiet().with(Body::Mars, 100.0, 0.6));
    let snapshots = engine.compute_transits(&sun_chart(), instant()).unwrap();
    let mars = snapshots.iter().find(|s| s.body.name == Body::Mars).unwrap();

    let json = serde_json::to_value(mars).unwrap();

    assert_eq!(json["body"]["name"], "MARS");
    assert_eq!(json["currentSign"], "cancer");
    assert_eq!(json["currentHouse"], 4);
    assert_eq!(json["houseRuler"], "moon");
    assert_eq!(json["aspects"][0]["type"], "square");
    assert_eq!(json["aspects"][0]["withBody"], "SUN");
    assert!(json.get("relevanceScore").is_none());
}
