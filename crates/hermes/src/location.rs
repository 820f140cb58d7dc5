//! Place name to coordinates and UTC offset.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use urania::GeoLocation;

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("No place found for {0:?}")]
    NotFound(String),
    #[error("Geocoding response unusable: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    /// Display name, e.g. "Casablanca, Morocco"
    pub name: String,
    pub location: GeoLocation,
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<ResolvedPlace, LocationError>;
}

/// Resolver backed by the Open-Meteo geocoding and forecast APIs.
///
/// The offset is the zone's offset today, not at the birth date, so births
/// on the other side of a daylight saving change are off by the DST shift.
pub struct OpenMeteoResolver {
    http: reqwest::Client,
    search_url: String,
    timezone_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OffsetResponse {
    utc_offset_seconds: i32,
    #[serde(default)]
    timezone: Option<String>,
}

impl OpenMeteoResolver {
    pub fn new(
        search_url: impl Into<String>,
        timezone_url: impl Into<String>,
    ) -> Result<Self, LocationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            search_url: search_url.into(),
            timezone_url: timezone_url.into(),
        })
    }

    async fn utc_offset(&self, location: GeoLocation) -> Result<OffsetResponse, LocationError> {
        let rsp = self
            .http
            .get(&self.timezone_url)
            .query(&[
                ("latitude", location.lat.to_string()),
                ("longitude", location.lon.to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(rsp.json::<OffsetResponse>().await?)
    }
}

#[async_trait]
impl LocationResolver for OpenMeteoResolver {
    async fn resolve(&self, query: &str) -> Result<ResolvedPlace, LocationError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LocationError::NotFound(String::new()));
        }

        let rsp = self
            .http
            .get(&self.search_url)
            .query(&[("name", query), ("count", "1"), ("format", "json")])
            .send()
            .await?
            .error_for_status()?;
        let hit = best_hit(rsp.json::<SearchResponse>().await?, query)?;

        let location = GeoLocation {
            lat: hit.latitude,
            lon: hit.longitude,
        };
        let offset = self.utc_offset(location).await?;
        let place = ResolvedPlace {
            name: display_name(&hit),
            location,
            utc_offset_minutes: offset.utc_offset_seconds / 60,
            timezone: offset.timezone.or(hit.timezone),
        };
        log::info!(
            "resolved {query:?} to {} ({:.4}, {:.4}, UTC{:+} min)",
            place.name,
            place.location.lat,
            place.location.lon,
            place.utc_offset_minutes
        );
        Ok(place)
    }
}

fn best_hit(response: SearchResponse, query: &str) -> Result<SearchHit, LocationError> {
    let hit = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| LocationError::NotFound(query.to_string()))?;
    let valid = (-90.0..=90.0).contains(&hit.latitude) && (-180.0..=180.0).contains(&hit.longitude);
    if !valid {
        return Err(LocationError::Malformed(format!(
            "coordinates out of range: {}, {}",
            hit.latitude, hit.longitude
        )));
    }
    Ok(hit)
}

fn display_name(hit: &SearchHit) -> String {
    match &hit.country {
        Some(country) => format!("{}, {}", hit.name, country),
        None => hit.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_hit_takes_first_result() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"results":[
                {"id":1,"name":"Casablanca","latitude":33.58831,"longitude":-7.61138,"country":"Morocco","timezone":"Africa/Casablanca"},
                {"id":2,"name":"Casablanca","latitude":-33.31,"longitude":-71.41,"country":"Chile"}
            ]}"#,
        )
        .unwrap();

        let hit = best_hit(response, "Casablanca").unwrap();

        assert_eq!(display_name(&hit), "Casablanca, Morocco");
        assert!((hit.latitude - 33.58831).abs() < 1e-9);
    }

    #[test]
    fn test_no_results_is_not_found() {
        let response: SearchResponse = serde_json::from_str(r#"{"generationtime_ms":0.5}"#).unwrap();

        let err = best_hit(response, "Atlantis").unwrap_err();

        assert!(matches!(err, LocationError::NotFound(q) if q == "Atlantis"));
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let response: SearchResponse =
            serde_json::from_str(r#"{"results":[{"name":"X","latitude":95.0,"longitude":0.0}]}"#)
                .unwrap();

        assert!(matches!(best_hit(response, "X"), Err(LocationError::Malformed(_))));
    }

    #[test]
    fn test_offset_response_parses() {
        let offset: OffsetResponse = serde_json::from_str(
            r#"{"latitude":48.86,"longitude":2.35,"utc_offset_seconds":7200,"timezone":"Europe/Paris"}"#,
        )
        .unwrap();

        assert_eq!(offset.utc_offset_seconds / 60, 120);
        assert_eq!(offset.timezone.as_deref(), Some("Europe/Paris"));
    }
}
