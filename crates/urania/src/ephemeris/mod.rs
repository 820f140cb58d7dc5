pub mod adapter;
pub mod types;

pub use adapter::{datetime_to_julian_day, SwissEphemerisAdapter, DEFAULT_EPHEMERIS_PATH};
pub use types::{
    Body, BodyPosition, EphemerisError, EphemerisProvider, GeoLocation, HouseCusps,
};
