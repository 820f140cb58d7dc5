#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hermes::location::{LocationError, LocationResolver, ResolvedPlace};
use hermes::narrative::{NarrativeError, NarrativeGenerator};
use hermes::prompt::PromptContext;
use hermes::store::MemoryStore;
use hermes::Oracle;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use urania::{
    Body, BodyPosition, EphemerisError, EphemerisProvider, GeoLocation, HouseCusps, NatalBody,
    NatalChart,
};

/// Same positions at every instant; equal houses from 0° everywhere.
pub struct StaticEphemeris {
    positions: HashMap<Body, f64>,
    threads: Mutex<HashSet<ThreadId>>,
}

impl StaticEphemeris {
    /// Bodies placed so none aspects a natal Sun at 10°.
    pub fn parked() -> Self {
        let positions = [
            (Body::Sun, 170.0),
            (Body::Moon, 175.0),
            (Body::Mercury, 180.0),
            (Body::Venus, 155.0),
            (Body::Mars, 150.0),
            (Body::Jupiter, 120.0),
            (Body::Saturn, 115.0),
            (Body::Uranus, 90.0),
            (Body::Neptune, 85.0),
            (Body::Pluto, 80.0),
        ];
        Self {
            positions: positions.into_iter().collect(),
            threads: Mutex::new(HashSet::new()),
        }
    }

    pub fn with(mut self, body: Body, longitude: f64) -> Self {
        self.positions.insert(body, longitude);
        self
    }

    /// Threads that asked for a body position.
    pub fn threads(&self) -> HashSet<ThreadId> {
        self.threads.lock().unwrap().clone()
    }
}

impl EphemerisProvider for StaticEphemeris {
    fn position_of(&self, body: Body, instant: DateTime<Utc>) -> Result<BodyPosition, EphemerisError> {
        self.threads.lock().unwrap().insert(std::thread::current().id());
        self.positions
            .get(&body)
            .map(|&longitude| BodyPosition { longitude, speed: 0.6 })
            .ok_or_else(|| EphemerisError::CalculationFailed {
                body,
                datetime: instant,
                message: "not placed".to_string(),
            })
    }

    fn house_cusps(
        &self,
        _instant: DateTime<Utc>,
        _location: GeoLocation,
    ) -> Result<HouseCusps, EphemerisError> {
        let cusps: [f64; 12] = std::array::from_fn(|i| i as f64 * 30.0);
        Ok(HouseCusps {
            system: "equal".to_string(),
            cusps,
            ascendant: 0.0,
            midheaven: 270.0,
        })
    }
}

/// Narrator that records every prompt and answers with a fixed text.
pub struct ScriptedNarrator {
    reply: Option<String>,
    pub prompts: Mutex<Vec<PromptContext>>,
}

impl ScriptedNarrator {
    pub fn answering(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Every call fails as an empty completion would.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> Option<PromptContext> {
        self.prompts.lock().unwrap().last().cloned()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl NarrativeGenerator for ScriptedNarrator {
    async fn generate(&self, prompt: &PromptContext) -> Result<String, NarrativeError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.reply.clone().ok_or(NarrativeError::EmptyResponse)
    }
}

/// Resolves only the places it was given.
#[derive(Default)]
pub struct FakeResolver {
    places: HashMap<String, ResolvedPlace>,
}

impl FakeResolver {
    pub fn with_paris() -> Arc<Self> {
        let mut places = HashMap::new();
        places.insert(
            "paris".to_string(),
            ResolvedPlace {
                name: "Paris, France".to_string(),
                location: GeoLocation { lat: 48.8534, lon: 2.3488 },
                utc_offset_minutes: 120,
                timezone: Some("Europe/Paris".to_string()),
            },
        );
        Arc::new(Self { places })
    }
}

#[async_trait]
impl LocationResolver for FakeResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedPlace, LocationError> {
        self.places
            .get(&query.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| LocationError::NotFound(query.to_string()))
    }
}

/// Ascendant 0°, equal houses, natal Sun at 10°.
pub fn sun_chart() -> NatalChart {
    NatalChart {
        ascendant: 0.0,
        houses: Some((0..12).map(|i| i as f64 * 30.0).collect()),
        planets: Some(vec![NatalBody::at(Body::Sun, 10.0)]),
        birth: None,
    }
}

pub fn oracle(
    provider: StaticEphemeris,
    store: Arc<MemoryStore>,
    narrator: Arc<ScriptedNarrator>,
) -> Oracle<StaticEphemeris> {
    Oracle::new(provider, store.clone(), store, narrator)
}
