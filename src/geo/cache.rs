//! Read-through coordinate cache
//!
//! Looks up (address, country) in the cache store first and only asks the
//! providers on a miss. Successful provider results are written back;
//! entries are never updated or expired.

use crate::coord::Coordinates;
use crate::error::Result;
use crate::field::LookupService;
use crate::geo::registry::ProviderRegistry;
use crate::store::{cache_lookup_statement, CacheEntry, CacheStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// A resolved reference coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub coords: Coordinates,
    /// Cache lookup statement on a hit, `provider:<name>` on a miss
    pub provenance: String,
    /// True if the coordinate came from the cache
    pub cached: bool,
}

/// Coordinate cache in front of the provider registry
#[derive(Clone)]
pub struct CoordinateCache {
    store: Arc<dyn CacheStore>,
    registry: Arc<ProviderRegistry>,
}

impl std::fmt::Debug for CoordinateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinateCache")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl CoordinateCache {
    pub fn new(store: Arc<dyn CacheStore>, registry: Arc<ProviderRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Resolve an address/country pair
    ///
    /// Both inputs are trimmed; a missing country is keyed as "". Returns
    /// None if the pair is not cached and no service resolves it. Only a
    /// failing cache read is an error.
    pub fn resolve(
        &self,
        address: &str,
        country: Option<&str>,
        services: &[LookupService],
    ) -> Result<Option<Resolution>> {
        let address = address.trim();
        let country = country.map(str::trim).unwrap_or("");

        if let Some(entry) = self.store.find(address, country)? {
            debug!(address, country, "coordinate cache hit");
            return Ok(Some(Resolution {
                coords: entry.coordinates(),
                provenance: cache_lookup_statement(address, country),
                cached: true,
            }));
        }

        if services.is_empty() {
            return Ok(None);
        }

        debug!(address, country, "coordinate cache miss");
        let country_arg = Some(country).filter(|c| !c.is_empty());
        let address_arg = Some(address).filter(|a| !a.is_empty());
        let Some(hit) = self
            .registry
            .resolve_with_providers(services, country_arg, address_arg)
        else {
            return Ok(None);
        };

        let provenance = format!("provider:{}", hit.provider);
        let entry = CacheEntry::new(address, country, hit.coords, provenance.clone());
        if let Err(e) = self.store.insert(entry) {
            warn!(address, country, error = %e, "failed to write coordinate cache entry");
        }

        Ok(Some(Resolution {
            coords: hit.coords,
            provenance,
            cached: false,
        }))
    }
}
