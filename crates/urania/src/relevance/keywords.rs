//! Keyword dictionaries for question relevance.
//!
//! The built-in dictionary lives in `keywords.toml` next to this file and is
//! parsed once; [`KeywordDictionary::from_toml_str`] accepts the same layout
//! for custom or extended locales.

use crate::ephemeris::Body;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

const BUILTIN_KEYWORDS: &str = include_str!("keywords.toml");

lazy_static::lazy_static! {
    static ref BUILTIN: KeywordDictionary = KeywordDictionary::from_toml_str(BUILTIN_KEYWORDS)
        .expect("built-in keywords.toml is valid");
}

#[derive(Error, Debug)]
pub enum KeywordError {
    #[error("keyword dictionary is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown planet key in keyword dictionary: {0}")]
    UnknownPlanet(String),
    #[error("house key must be 1-12, got {0}")]
    InvalidHouse(String),
}

/// Terms for one theme, per locale.
#[derive(Debug, Clone, Default, Deserialize)]
struct LocalizedTerms {
    #[serde(default)]
    en: Vec<String>,
    #[serde(default)]
    fr: Vec<String>,
    #[serde(default)]
    ar: Vec<String>,
}

impl LocalizedTerms {
    /// All locales merged into one list of distinct lower-cased terms.
    ///
    /// Spellings shared between locales ("communication", "finance") appear
    /// once, and a term containing a shorter term of the same theme ("الحب"
    /// next to "حب", "children" next to "child") is dropped, so one concept
    /// in a question is one hit.
    fn flatten(self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for term in self.en.into_iter().chain(self.fr).chain(self.ar) {
            let term = term.trim().to_lowercase();
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }

        terms
            .iter()
            .filter(|t| !terms.iter().any(|other| other != *t && t.contains(other.as_str())))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct KeywordsToml {
    #[serde(default)]
    temporal: LocalizedTerms,
    #[serde(default)]
    travel: LocalizedTerms,
    #[serde(default)]
    planets: HashMap<String, LocalizedTerms>,
    #[serde(default)]
    houses: HashMap<String, LocalizedTerms>,
}

/// Lower-cased substrings matched against a lower-cased question.
#[derive(Debug, Clone)]
pub struct KeywordDictionary {
    temporal: Vec<String>,
    travel: Vec<String>,
    planets: HashMap<Body, Vec<String>>,
    houses: HashMap<u8, Vec<String>>,
}

impl KeywordDictionary {
    /// The dictionary shipped with the crate.
    pub fn builtin() -> &'static KeywordDictionary {
        &BUILTIN
    }

    pub fn from_toml_str(text: &str) -> Result<Self, KeywordError> {
        let raw: KeywordsToml = toml::from_str(text)?;

        let mut planets = HashMap::new();
        for (key, terms) in raw.planets {
            let body = Body::from_name(&key).ok_or_else(|| KeywordError::UnknownPlanet(key.clone()))?;
            planets.insert(body, terms.flatten());
        }

        let mut houses = HashMap::new();
        for (key, terms) in raw.houses {
            let house = key
                .parse::<u8>()
                .ok()
                .filter(|h| (1..=12).contains(h))
                .ok_or_else(|| KeywordError::InvalidHouse(key.clone()))?;
            houses.insert(house, terms.flatten());
        }

        Ok(Self {
            temporal: raw.temporal.flatten(),
            travel: raw.travel.flatten(),
            planets,
            houses,
        })
    }

    /// Question asks about a span of time ("this month", "le reste de l'année").
    pub fn is_temporal(&self, question: &str) -> bool {
        contains_any(question, &self.temporal)
    }

    pub fn is_travel(&self, question: &str) -> bool {
        contains_any(question, &self.travel)
    }

    /// Number of the body's theme keywords present in the question.
    pub fn planet_hits(&self, body: Body, question: &str) -> usize {
        self.planets
            .get(&body)
            .map_or(0, |terms| count_hits(question, terms))
    }

    /// Number of the house's theme keywords present in the question.
    pub fn house_hits(&self, house: u8, question: &str) -> usize {
        self.houses
            .get(&house)
            .map_or(0, |terms| count_hits(question, terms))
    }
}

fn contains_any(question: &str, terms: &[String]) -> bool {
    terms.iter().any(|t| question.contains(t.as_str()))
}

fn count_hits(question: &str, terms: &[String]) -> usize {
    terms.iter().filter(|t| question.contains(t.as_str())).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_all_bodies_and_houses() {
        let dict = KeywordDictionary::builtin();
        for body in Body::ALL {
            assert!(dict.planets.get(&body).is_some_and(|t| !t.is_empty()), "{body}");
        }
        for house in 1..=12u8 {
            assert!(dict.houses.get(&house).is_some_and(|t| !t.is_empty()), "house {house}");
        }
    }

    #[test]
    fn test_multilingual_matching() {
        let dict = KeywordDictionary::builtin();
        assert_eq!(dict.planet_hits(Body::Venus, "will i find love?"), 1);
        assert!(dict.planet_hits(Body::Venus, "et mon amour ?") >= 1);
        assert_eq!(dict.planet_hits(Body::Venus, "هل سأجد الحب"), 1);
        assert!(dict.is_temporal("what about this month"));
        assert!(dict.is_temporal("pour le reste de l'année"));
        assert!(dict.is_travel("should i plan a trip"));
        assert!(dict.is_travel("هل السفر مناسب"));
    }

    #[test]
    fn test_shared_spellings_count_once() {
        let dict = KeywordDictionary::builtin();
        assert_eq!(dict.planet_hits(Body::Mercury, "communication"), 1);
        assert_eq!(dict.planet_hits(Body::Pluto, "transformation"), 1);
        assert_eq!(dict.planet_hits(Body::Jupiter, "une opportunité"), 1);
        assert_eq!(dict.house_hits(2, "my finance"), 1);
        assert_eq!(dict.house_hits(4, "my parents"), 1);
        assert_eq!(dict.house_hits(12, "a secret"), 1);
    }

    #[test]
    fn test_nested_terms_count_once() {
        let dict = KeywordDictionary::from_toml_str(
            r#"
            [planets.venus]
            en = ["Love", "love", " lover "]
            fr = ["love"]
            ar = ["حب", "الحب"]
            "#,
        )
        .unwrap();
        assert_eq!(dict.planets[&Body::Venus], vec!["love", "حب"]);
        assert_eq!(dict.planet_hits(Body::Venus, "my lover"), 1);
        assert_eq!(dict.planet_hits(Body::Venus, "الحب"), 1);
        assert_eq!(dict.planet_hits(Body::Venus, "love, الحب"), 2);
    }

    #[test]
    fn test_custom_dictionary() {
        let dict = KeywordDictionary::from_toml_str(
            r#"
            [temporal]
            en = ["week"]
            [planets.mars]
            en = ["Gym"]
            [houses.6]
            fr = ["santé"]
            "#,
        )
        .unwrap();
        assert!(dict.is_temporal("next week"));
        assert!(!dict.is_travel("trip"));
        assert_eq!(dict.planet_hits(Body::Mars, "gym tomorrow"), 1);
        assert_eq!(dict.house_hits(6, "ma santé"), 1);
        assert_eq!(dict.house_hits(7, "ma santé"), 0);
    }

    #[test]
    fn test_invalid_keys_rejected() {
        assert!(matches!(
            KeywordDictionary::from_toml_str("[planets.vulcan]\nen = [\"x\"]"),
            Err(KeywordError::UnknownPlanet(_))
        ));
        assert!(matches!(
            KeywordDictionary::from_toml_str("[houses.13]\nen = [\"x\"]"),
            Err(KeywordError::InvalidHouse(_))
        ));
    }
}
