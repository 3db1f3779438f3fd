//! Geocoding lookups
//!
//! Resolves free-text addresses to coordinates through pluggable providers,
//! with a persistent read-through cache in front of them.
//!
//! ## Flex Point
//! Adding a new provider requires:
//! 1. Create `src/geo/{provider}.rs` implementing `LookupProvider`
//! 2. Add `pub mod {provider};` below
//! 3. Register it in `ProviderRegistry::from_config`

pub mod cache;
pub mod google;
pub mod nominatim;
pub mod registry;

use crate::coord::Coordinates;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Outcome of a single provider lookup
///
/// A provider that answered but found nothing reports `has_error`; the
/// registry then moves on to the next provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub has_error: bool,
    /// Provider message for failed lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LookupResult {
    /// A successful lookup
    pub fn found(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            has_error: false,
            message: None,
        }
    }

    /// A lookup that produced no usable coordinate
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            lat: 0.0,
            lng: 0.0,
            has_error: true,
            message: Some(message.into()),
        }
    }

    /// Coordinates of a successful lookup
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Trait for geocoding providers
///
/// Implementations must be thread-safe (Send + Sync); the registry shares
/// them across request threads. Calls block until the provider answers.
pub trait LookupProvider: Send + Sync {
    /// Returns a human-readable description of this provider
    fn description(&self) -> &str;

    /// Resolve a country/address pair to coordinates
    ///
    /// # Arguments
    /// * `country` - Two-letter country code, if known
    /// * `address` - Free-text address, if known
    /// * `api_token` - Provider credential configured on the field
    fn get_coordinates(
        &self,
        country: Option<&str>,
        address: Option<&str>,
        api_token: Option<&str>,
    ) -> Result<LookupResult>;
}

/// Fetch and decode a JSON document with a blocking client
///
/// Runs the request on a separate thread so providers can be called from
/// inside a tokio runtime.
pub(crate) fn fetch_json<T>(url: String, user_agent: &str, timeout: Duration) -> Result<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let user_agent = user_agent.to_string();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = (|| -> Result<T> {
            let client = reqwest::blocking::Client::builder()
                .user_agent(user_agent)
                .timeout(timeout)
                .build()
                .map_err(|e| Error::Geocoding(format!("Failed to build HTTP client: {}", e)))?;

            let response = client
                .get(&url)
                .send()
                .map_err(|e| Error::Geocoding(format!("Request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(Error::Geocoding(format!(
                    "Provider returned status: {}",
                    response.status()
                )));
            }

            response
                .json()
                .map_err(|e| Error::Geocoding(format!("Failed to parse response: {}", e)))
        })();

        let _ = tx.send(result);
    });

    rx.recv()
        .map_err(|_| Error::Geocoding("Failed to receive response from HTTP thread".to_string()))?
}

/// Treat blank strings as absent
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_result_constructors() {
        let ok = LookupResult::found(52.5, 13.4);
        assert!(!ok.has_error);
        assert_eq!(ok.coordinates(), Coordinates::new(52.5, 13.4));

        let failed = LookupResult::failed("ZERO_RESULTS");
        assert!(failed.has_error);
        assert_eq!(failed.message.as_deref(), Some("ZERO_RESULTS"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some(" de ")), Some("de"));
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(None), None);
    }
}
