//! Nominatim geocoding provider (OpenStreetMap)
//!
//! Uses the free Nominatim search API. No API token is needed; the usage
//! policy requires an identifying User-Agent and at most one request per
//! second, which the coordinate cache keeps us well under.

use crate::config::defaults::{DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::constants::api::NOMINATIM_URL;
use crate::error::{Error, Result};
use crate::geo::{fetch_json, non_empty, LookupProvider, LookupResult};
use serde::Deserialize;
use std::time::Duration;

/// Nominatim geocoding provider
#[derive(Debug, Clone)]
pub struct NominatimProvider {
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

/// Nominatim search response item
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

impl NominatimProvider {
    /// Create a provider against the public Nominatim instance
    pub fn new() -> Self {
        Self {
            base_url: NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        }
    }

    /// Point the provider at another Nominatim instance
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the User-Agent sent with every request
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the search URL, or None if there is nothing to search for
    fn search_url(&self, country: Option<&str>, address: Option<&str>) -> Option<String> {
        let country = non_empty(country);
        let query = non_empty(address).or(country)?;

        let mut url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(query)
        );
        if let Some(code) = country {
            url.push_str(&format!(
                "&countrycodes={}",
                urlencoding::encode(&code.to_lowercase())
            ));
        }
        Some(url)
    }

    /// Parse lat/lng strings to f64
    fn parse_coords(lat: &str, lng: &str) -> Result<(f64, f64)> {
        let lat: f64 = lat
            .parse()
            .map_err(|_| Error::Geocoding(format!("Invalid latitude: {}", lat)))?;
        let lng: f64 = lng
            .parse()
            .map_err(|_| Error::Geocoding(format!("Invalid longitude: {}", lng)))?;
        Ok((lat, lng))
    }
}

impl Default for NominatimProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LookupProvider for NominatimProvider {
    fn description(&self) -> &str {
        "OpenStreetMap Nominatim search"
    }

    fn get_coordinates(
        &self,
        country: Option<&str>,
        address: Option<&str>,
        _api_token: Option<&str>,
    ) -> Result<LookupResult> {
        let Some(url) = self.search_url(country, address) else {
            return Ok(LookupResult::failed("Nothing to search for"));
        };

        let results: Vec<NominatimResult> = fetch_json(url, &self.user_agent, self.timeout)?;

        match results.into_iter().next() {
            Some(result) => {
                let (lat, lng) = Self::parse_coords(&result.lat, &result.lon)?;
                Ok(LookupResult::found(lat, lng))
            }
            None => Ok(LookupResult::failed("No results")),
        }
    }
}
