//! Google Maps geocoding provider
//!
//! Uses the Geocoding API (`/maps/api/geocode/json`). The API token comes
//! from the field's lookup service entry, so different fields can bill
//! against different keys.

use crate::config::defaults::{DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::constants::api::GOOGLE_MAPS_URL;
use crate::error::Result;
use crate::geo::{fetch_json, non_empty, LookupProvider, LookupResult};
use serde::Deserialize;
use std::time::Duration;

/// Google Maps geocoding provider
#[derive(Debug, Clone)]
pub struct GoogleMapsProvider {
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

impl GoogleMapsProvider {
    /// Create a provider against the public Google Maps endpoint
    pub fn new() -> Self {
        Self {
            base_url: GOOGLE_MAPS_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn geocode_url(
        &self,
        country: Option<&str>,
        address: Option<&str>,
        api_token: Option<&str>,
    ) -> Option<String> {
        let country = non_empty(country);
        let address = non_empty(address);
        if country.is_none() && address.is_none() {
            return None;
        }

        let mut params = Vec::new();
        if let Some(address) = address {
            params.push(format!("address={}", urlencoding::encode(address)));
        }
        if let Some(code) = country {
            params.push(format!(
                "components={}",
                urlencoding::encode(&format!("country:{}", code.to_uppercase()))
            ));
        }
        if let Some(key) = non_empty(api_token) {
            params.push(format!("key={}", urlencoding::encode(key)));
        }

        Some(format!(
            "{}/maps/api/geocode/json?{}",
            self.base_url,
            params.join("&")
        ))
    }
}

impl Default for GoogleMapsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LookupProvider for GoogleMapsProvider {
    fn description(&self) -> &str {
        "Google Maps Geocoding API"
    }

    fn get_coordinates(
        &self,
        country: Option<&str>,
        address: Option<&str>,
        api_token: Option<&str>,
    ) -> Result<LookupResult> {
        let Some(url) = self.geocode_url(country, address, api_token) else {
            return Ok(LookupResult::failed("Nothing to search for"));
        };

        let response: GeocodeResponse = fetch_json(url, &self.user_agent, self.timeout)?;

        if response.status != "OK" {
            let message = match response.error_message {
                Some(detail) => format!("{}: {}", response.status, detail),
                None => response.status,
            };
            return Ok(LookupResult::failed(message));
        }

        match response.results.into_iter().next() {
            Some(result) => Ok(LookupResult::found(
                result.geometry.location.lat,
                result.geometry.location.lng,
            )),
            None => Ok(LookupResult::failed("No results")),
        }
    }
}
