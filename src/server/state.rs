//! Server shared state
//!
//! Holds configuration and shared resources for the HTTP server. Ranking
//! engines are built per request so distance results never outlive the
//! request that computed them; the coordinate cache and stores are shared.

use crate::config::Config;
use crate::error::{ResolutionError, Result};
use crate::field::RecordModel;
use crate::geo::cache::CoordinateCache;
use crate::geo::registry::ProviderRegistry;
use crate::rank::RankingEngine;
use crate::store::json::JsonCacheStore;
use crate::store::memory::{Dataset, MemoryStore};
use crate::store::{CacheStore, DistanceStore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::info;

/// Shared state for the HTTP server
pub struct AppState {
    /// Configuration
    pub config: Arc<RwLock<Config>>,

    model: Arc<RecordModel>,
    resolver: CoordinateCache,
    distance_store: Arc<dyn DistanceStore>,
    degraded_runs: Arc<AtomicU64>,
    started: Instant,
}

impl AppState {
    /// Create application state with the built-in providers
    pub fn new(
        config: Config,
        cache_store: Arc<dyn CacheStore>,
        distance_store: Arc<dyn DistanceStore>,
    ) -> Result<Self> {
        let registry = ProviderRegistry::from_config(&config.providers);
        Self::with_registry(config, registry, cache_store, distance_store)
    }

    /// Create application state with an explicit provider registry
    pub fn with_registry(
        config: Config,
        registry: ProviderRegistry,
        cache_store: Arc<dyn CacheStore>,
        distance_store: Arc<dyn DistanceStore>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            model: Arc::new(config.model.clone()),
            resolver: CoordinateCache::new(cache_store, Arc::new(registry)),
            distance_store,
            config: Arc::new(RwLock::new(config)),
            degraded_runs: Arc::new(AtomicU64::new(0)),
            started: Instant::now(),
        })
    }

    /// Open the configured cache file and dataset
    pub fn from_config(config: Config) -> Result<Self> {
        let cache = match &config.store.cache_path {
            Some(path) => JsonCacheStore::open(path.clone())?,
            None => JsonCacheStore::open_default()?,
        };
        info!(path = %cache.path().display(), entries = cache.len(), "opened coordinate cache");

        let dataset = match &config.store.dataset_path {
            Some(path) => {
                let dataset = Dataset::load_from(path)?;
                info!(
                    path = %path.display(),
                    points = dataset.points.len(),
                    tables = dataset.tables.len(),
                    "loaded dataset"
                );
                dataset
            }
            None => Dataset::default(),
        };

        Self::new(config, Arc::new(cache), Arc::new(MemoryStore::with_dataset(dataset)))
    }

    /// Build a ranking engine for one request
    ///
    /// Returns None if no field has this id.
    pub async fn engine(&self, field_id: &str) -> Option<RankingEngine> {
        let field = self.config.read().await.field(field_id)?.clone();
        let degraded_runs = self.degraded_runs.clone();

        Some(
            RankingEngine::new(
                field,
                self.model.clone(),
                self.resolver.clone(),
                self.distance_store.clone(),
            )
            .with_degradation_hook(Arc::new(move |_: &ResolutionError| {
                degraded_runs.fetch_add(1, Ordering::Relaxed);
            })),
        )
    }

    /// Configured field ids, in configuration order
    pub async fn field_ids(&self) -> Vec<String> {
        self.config
            .read()
            .await
            .fields
            .iter()
            .map(|f| f.id.clone())
            .collect()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.resolver.registry()
    }

    pub fn resolver(&self) -> &CoordinateCache {
        &self.resolver
    }

    /// Number of ranking runs that fell back to the input order
    pub fn degraded_runs(&self) -> u64 {
        self.degraded_runs.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
