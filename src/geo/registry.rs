//! Provider registry
//!
//! Maps provider names to implementations. Fields reference providers by
//! name; names nobody registered are skipped, so a field can list providers
//! that are not available in every deployment.

use crate::config::ProvidersConfig;
use crate::constants::providers::{GOOGLE_MAPS, OPENSTREETMAP};
use crate::coord::Coordinates;
use crate::field::LookupService;
use crate::geo::google::GoogleMapsProvider;
use crate::geo::nominatim::NominatimProvider;
use crate::geo::LookupProvider;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A successful resolution and the provider that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHit {
    pub coords: Coordinates,
    pub provider: String,
}

/// Information about a registered provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (used in field configuration)
    pub name: String,
    /// Human-readable description
    pub description: String,
}

/// Named set of lookup providers
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn LookupProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in providers, configured from settings
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut registry = Self::new();
        registry.register(
            OPENSTREETMAP,
            Arc::new(
                NominatimProvider::new()
                    .with_base_url(&config.nominatim_url)
                    .with_user_agent(&config.user_agent)
                    .with_timeout(timeout),
            ),
        );
        registry.register(
            GOOGLE_MAPS,
            Arc::new(
                GoogleMapsProvider::new()
                    .with_base_url(&config.google_url)
                    .with_user_agent(&config.user_agent)
                    .with_timeout(timeout),
            ),
        );
        registry
    }

    /// Register a provider, replacing any provider of the same name
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn LookupProvider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get a provider by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn LookupProvider>> {
        self.providers.get(name)
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// List registered providers with their info
    pub fn available_providers(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|(name, provider)| ProviderInfo {
                name: name.clone(),
                description: provider.description().to_string(),
            })
            .collect()
    }

    /// Try the services in order until one resolves the address
    ///
    /// Provider errors and error results move on to the next service;
    /// unknown service names are skipped. Returns None when nothing
    /// resolved.
    pub fn resolve_with_providers(
        &self,
        services: &[LookupService],
        country: Option<&str>,
        address: Option<&str>,
    ) -> Option<ProviderHit> {
        for service in services {
            let Some(provider) = self.get(&service.service) else {
                debug!(service = %service.service, "skipping unknown lookup service");
                continue;
            };

            let api_token = service.api_token.as_deref().filter(|t| !t.is_empty());
            match provider.get_coordinates(country, address, api_token) {
                Ok(result) if !result.has_error => {
                    debug!(service = %service.service, lat = result.lat, lng = result.lng, "lookup resolved");
                    return Some(ProviderHit {
                        coords: result.coordinates(),
                        provider: service.service.clone(),
                    });
                }
                Ok(result) => {
                    debug!(
                        service = %service.service,
                        message = result.message.as_deref().unwrap_or(""),
                        "lookup returned no usable result"
                    );
                }
                Err(e) => {
                    debug!(service = %service.service, error = %e, "lookup failed");
                }
            }
        }

        None
    }
}
