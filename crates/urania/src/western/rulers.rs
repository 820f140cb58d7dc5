//! Sign rulers for Western astrology.
//!
//! Traditional rulerships, with the modern co-rulers kept alongside for
//! Scorpio, Aquarius and Pisces.

use crate::ephemeris::Body;
use crate::geometry::{Sign, sign_index};

/// Ruling bodies of a sign (one, or traditional then modern)
pub fn sign_rulers(sign: Sign) -> &'static [Body] {
    const RULERS: [&[Body]; 12] = [
        &[Body::Mars],                  // Aries
        &[Body::Venus],                 // Taurus
        &[Body::Mercury],               // Gemini
        &[Body::Moon],                  // Cancer
        &[Body::Sun],                   // Leo
        &[Body::Mercury],               // Virgo
        &[Body::Venus],                 // Libra
        &[Body::Mars, Body::Pluto],     // Scorpio
        &[Body::Jupiter],               // Sagittarius
        &[Body::Saturn],                // Capricorn
        &[Body::Saturn, Body::Uranus],  // Aquarius
        &[Body::Jupiter, Body::Neptune], // Pisces
    ];
    RULERS[sign.index()]
}

/// Rulers of a sign as a single label, e.g. `"mars/pluto"`.
pub fn ruler_label(sign: Sign) -> String {
    sign_rulers(sign)
        .iter()
        .map(|b| b.name())
        .collect::<Vec<_>>()
        .join("/")
}

/// Ruler label for a house, taken from the sign on its cusp.
///
/// `None` when the house is unknown or the cusps are malformed.
pub fn house_ruler(house: Option<u8>, houses: Option<&[f64]>) -> Option<String> {
    let house = house?;
    let houses = houses?;
    if houses.len() != 12 || !(1..=12).contains(&house) {
        return None;
    }
    let cusp = houses[(house - 1) as usize];
    Some(ruler_label(Sign::from_index(sign_index(cusp))))
}
