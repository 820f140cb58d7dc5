//! Urania - natal and transit chart analysis
//!
//! Positions come from an [`ephemeris::EphemerisProvider`]; this crate turns
//! them into aspects, transit snapshots and question-ranked transit lists.

pub mod aspects;
pub mod chart;
pub mod ephemeris;
pub mod geometry;
pub mod relevance;
pub mod transit;
pub mod western;

pub use aspects::{Aspect, AspectDetector, AspectKind};
pub use chart::{compute_natal_chart, BirthData, CelestialBody, NatalBody, NatalChart};
pub use ephemeris::{
    Body, BodyPosition, EphemerisError, EphemerisProvider, GeoLocation, HouseCusps,
    SwissEphemerisAdapter,
};
pub use geometry::{DegreeMinute, Sign};
pub use relevance::{filter_relevant, KeywordDictionary, RelevanceFilter};
pub use transit::{build_snapshots, TransitEngine, TransitError, TransitSnapshot};
