//! Resolve command handler
//!
//! Resolves an address through the coordinate cache and the lookup
//! providers, writing new results to the cache.

use crate::cli::{parse_key_value, print_with};
use crate::config::Config;
use crate::constants::providers::OPENSTREETMAP;
use crate::error::{Error, Result};
use crate::field::LookupService;
use crate::format::ResolutionReport;
use crate::geo::cache::CoordinateCache;
use crate::geo::registry::ProviderRegistry;
use crate::store::json::JsonCacheStore;
use clap::Args;
use std::sync::Arc;

/// Resolve command arguments
#[derive(Args)]
pub struct ResolveArgs {
    /// Address to look up
    pub address: String,

    /// Country (ISO code) to restrict the lookup to
    #[arg(long)]
    pub country: Option<String>,

    /// Use the lookup services of this configured field
    #[arg(long, short = 'f', conflicts_with = "service")]
    pub field: Option<String>,

    /// Provider to try (name or name=api_token), repeatable, in order
    #[arg(long, short = 's')]
    pub service: Vec<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Lookup services from `--service` values, defaulting to OpenStreetMap
fn services_from_args(values: &[String]) -> Result<Vec<LookupService>> {
    if values.is_empty() {
        return Ok(vec![LookupService::new(OPENSTREETMAP)]);
    }

    values
        .iter()
        .map(|value| {
            if value.contains('=') {
                let (name, token) = parse_key_value(value).map_err(Error::Config)?;
                Ok(LookupService::new(name).with_api_token(token))
            } else {
                Ok(LookupService::new(value.as_str()))
            }
        })
        .collect()
}

/// Run the resolve command
pub async fn run(args: ResolveArgs, config: Config) -> Result<()> {
    let services = match &args.field {
        Some(id) => config
            .field(id)
            .ok_or_else(|| Error::Config(format!("Unknown field: {}", id)))?
            .lookup_services
            .clone(),
        None => services_from_args(&args.service)?,
    };

    let address = args.address.clone();
    let country = args.country.clone();

    // provider clients block; keep them off the async runtime
    let resolution = tokio::task::spawn_blocking(move || -> Result<_> {
        let store = match &config.store.cache_path {
            Some(path) => JsonCacheStore::open(path.clone())?,
            None => JsonCacheStore::open_default()?,
        };
        let registry = ProviderRegistry::from_config(&config.providers);
        let cache = CoordinateCache::new(Arc::new(store), Arc::new(registry));
        cache.resolve(&address, country.as_deref(), &services)
    })
    .await
    .map_err(|e| Error::Server(format!("Lookup task failed: {}", e)))??;

    let report = ResolutionReport::new(args.address.trim(), args.country.as_deref(), resolution);
    print_with(&args.format, |f| f.format_resolution(&report))
}
