//! In-memory store
//!
//! Holds the coordinate cache, the shared point table and any number of
//! record tables. Distance queries are evaluated in-process with the same
//! formula and rounding the SQL rendering uses. A dataset file (JSON) can
//! seed the point and record tables.

use crate::coord::distance::rounded_distance_km;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::field::RecordId;
use crate::store::{
    CacheEntry, CacheStore, DistanceQuery, DistanceRow, DistanceSource, DistanceStore,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::RwLock;

/// A row of the shared point table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRow {
    pub id: RecordId,
    pub att_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A row of a record table
///
/// Columns other than `id` are kept as raw JSON; coordinate columns are
/// read as numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: RecordId,
    #[serde(flatten)]
    pub columns: HashMap<String, serde_json::Value>,
}

impl RecordRow {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            columns: HashMap::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.columns.insert(name.into(), value.into());
        self
    }

    /// Numeric value of a column; None for missing, null or non-numeric
    pub fn number(&self, column: &str) -> Option<f64> {
        match self.columns.get(column)? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Point and record tables, as stored in a dataset file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub points: Vec<PointRow>,
    #[serde(default)]
    pub tables: HashMap<String, Vec<RecordRow>>,
}

impl Dataset {
    /// Load a dataset from a JSON file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Store(format!("Failed to read dataset {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            Error::Store(format!("Failed to parse dataset {}: {}", path.display(), e))
        })
    }
}

/// In-memory cache and distance store
#[derive(Debug, Default)]
pub struct MemoryStore {
    cache: RwLock<Vec<CacheEntry>>,
    dataset: RwLock<Dataset>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a dataset
    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            cache: RwLock::new(Vec::new()),
            dataset: RwLock::new(dataset),
        }
    }

    /// Add a row to the point table
    pub fn add_point(&self, id: RecordId, att_id: impl Into<String>, coords: Coordinates) -> Result<()> {
        let mut dataset = self.dataset.write().map_err(|_| poisoned())?;
        dataset.points.push(PointRow {
            id,
            att_id: att_id.into(),
            latitude: coords.lat,
            longitude: coords.lng,
        });
        Ok(())
    }

    /// Add a row to a record table, creating the table if needed
    pub fn add_record(&self, table: &str, row: RecordRow) -> Result<()> {
        let mut dataset = self.dataset.write().map_err(|_| poisoned())?;
        dataset.tables.entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    /// Snapshot of all cache entries, in insertion order
    pub fn cache_entries(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.cache.read().map_err(|_| poisoned())?.clone())
    }

    fn rank(query: &DistanceQuery, candidates: impl Iterator<Item = (RecordId, Coordinates)>) -> Vec<DistanceRow> {
        let mut rows: Vec<DistanceRow> = candidates
            .map(|(id, coords)| DistanceRow {
                id,
                distance: rounded_distance_km(query.reference, coords, query.precision),
            })
            .collect();

        let by_distance = |a: &DistanceRow, b: &DistanceRow| {
            a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal)
        };
        match query.direction {
            crate::store::SortDirection::Asc => rows.sort_by(by_distance),
            crate::store::SortDirection::Desc => rows.sort_by(|a, b| by_distance(b, a)),
        }
        rows
    }
}

fn poisoned() -> Error {
    Error::Store("Store lock poisoned".to_string())
}

impl CacheStore for MemoryStore {
    fn find(&self, search: &str, country: &str) -> Result<Option<CacheEntry>> {
        let cache = self.cache.read().map_err(|_| poisoned())?;
        Ok(cache
            .iter()
            .find(|e| e.search == search && e.country == country)
            .cloned())
    }

    fn insert(&self, entry: CacheEntry) -> Result<()> {
        self.cache.write().map_err(|_| poisoned())?.push(entry);
        Ok(())
    }
}

impl DistanceStore for MemoryStore {
    fn query_distances(&self, query: &DistanceQuery) -> Result<Vec<DistanceRow>> {
        let wanted: HashSet<RecordId> = query.ids.iter().copied().collect();
        let dataset = self.dataset.read().map_err(|_| poisoned())?;

        let rows = match &query.source {
            DistanceSource::PointStore { attribute_id } => Self::rank(
                query,
                dataset
                    .points
                    .iter()
                    .filter(|p| &p.att_id == attribute_id && wanted.contains(&p.id))
                    .map(|p| (p.id, Coordinates::new(p.latitude, p.longitude))),
            ),
            DistanceSource::RecordTable {
                table,
                lat_column,
                lng_column,
            } => {
                let records = dataset
                    .tables
                    .get(table)
                    .ok_or_else(|| Error::Store(format!("Unknown table: {}", table)))?;

                Self::rank(
                    query,
                    records
                        .iter()
                        .filter(|r| wanted.contains(&r.id))
                        .filter_map(|r| {
                            let lat = r.number(lat_column)?;
                            let lng = r.number(lng_column)?;
                            Some((r.id, Coordinates::new(lat, lng)))
                        }),
                )
            }
        };

        Ok(rows)
    }
}
