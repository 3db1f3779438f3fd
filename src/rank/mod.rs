//! Distance ranking
//!
//! One `RankingEngine` serves one distance field. It resolves the request's
//! address to a reference coordinate, asks the store for the distance of
//! every candidate record and reorders the candidates: records with a
//! distance first, sorted by it, then everything else in input order.
//!
//! Ranking never fails the caller. Configuration gaps and lookup misses
//! leave the order unchanged silently; store and attribute failures do the
//! same but are logged and reported to the degradation hook.

use crate::constants::geo::NO_DISTANCE;
use crate::error::{Error, ResolutionError, Stage};
use crate::field::{DataMode, FieldConfiguration, RecordId, RecordModel};
use crate::geo::cache::CoordinateCache;
use crate::request::{country_information, read_address, RequestReader};
use crate::store::{DistanceQuery, DistanceRow, DistanceSource, DistanceStore, SortDirection};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

#[cfg(test)]
mod tests;

/// Callback invoked whenever a ranking run degrades to the input order
pub type DegradationHook = Arc<dyn Fn(&ResolutionError) + Send + Sync>;

/// Ranking engine for one distance field
pub struct RankingEngine {
    field: FieldConfiguration,
    model: Arc<RecordModel>,
    resolver: CoordinateCache,
    store: Arc<dyn DistanceStore>,
    /// None until the first ranking run for this field
    distances: RwLock<Option<HashMap<RecordId, f64>>>,
    on_degraded: Option<DegradationHook>,
}

impl std::fmt::Debug for RankingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankingEngine")
            .field("field", &self.field.id)
            .field("table", &self.model.table_name)
            .finish_non_exhaustive()
    }
}

impl RankingEngine {
    pub fn new(
        field: FieldConfiguration,
        model: Arc<RecordModel>,
        resolver: CoordinateCache,
        store: Arc<dyn DistanceStore>,
    ) -> Self {
        Self {
            field,
            model,
            resolver,
            store,
            distances: RwLock::new(None),
            on_degraded: None,
        }
    }

    /// Report degraded runs to `hook` in addition to the log
    pub fn with_degradation_hook(mut self, hook: DegradationHook) -> Self {
        self.on_degraded = Some(hook);
        self
    }

    pub fn field(&self) -> &FieldConfiguration {
        &self.field
    }

    /// Reorder `ids` by distance to the request's address
    ///
    /// Returns a permutation of `ids`: ranked records in `direction`,
    /// followed by unranked records in their original order. Any failure
    /// returns `ids` unchanged.
    ///
    /// Unless `ids` is empty or the field is unconfigured, the run counts as
    /// the field's distance computation even when it fails, so a following
    /// `get_data_for` does not repeat it.
    pub fn sort_ids(
        &self,
        ids: &[RecordId],
        direction: SortDirection,
        request: &dyn RequestReader,
    ) -> Vec<RecordId> {
        match self.rank(ids, direction, request) {
            Ok(Some(ranked)) => ranked,
            Ok(None) => ids.to_vec(),
            Err(e) => {
                self.degraded(&e);
                ids.to_vec()
            }
        }
    }

    /// Distance in kilometers for each id, or -1 if none is known
    ///
    /// The first call for this field runs the ranking pipeline (ascending)
    /// to populate the distances. After that the stored distances are
    /// served as they are until `invalidate` is called, even for ids the
    /// first run did not cover.
    pub fn get_data_for(
        &self,
        ids: &[RecordId],
        request: &dyn RequestReader,
    ) -> BTreeMap<RecordId, f64> {
        let populated = self
            .distances
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some();

        if !populated {
            self.sort_ids(ids, SortDirection::Asc, request);
            self.distances
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .get_or_insert_with(HashMap::new);
        }

        let distances = self.distances.read().unwrap_or_else(|e| e.into_inner());
        ids.iter()
            .map(|id| {
                let distance = distances
                    .as_ref()
                    .and_then(|d| d.get(id).copied())
                    .unwrap_or(NO_DISTANCE);
                (*id, distance)
            })
            .collect()
    }

    /// Forget all stored distances; the next `get_data_for` recomputes
    pub fn invalidate(&self) {
        *self.distances.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Snapshot of the stored distances
    pub fn cached_distances(&self) -> HashMap<RecordId, f64> {
        self.distances
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .unwrap_or_default()
    }

    /// The ranking pipeline; Ok(None) means "leave the order alone"
    fn rank(
        &self,
        ids: &[RecordId],
        direction: SortDirection,
        request: &dyn RequestReader,
    ) -> Result<Option<Vec<RecordId>>, ResolutionError> {
        if ids.is_empty() {
            return Ok(None);
        }
        if !self.field.is_configured() {
            debug!(field = %self.field.id, "distance field not configured, skipping");
            return Ok(None);
        }
        // whatever happens from here on counts as this field's run
        self.distances
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .get_or_insert_with(HashMap::new);

        let address = read_address(&self.field, request);
        let country = country_information(&self.field, request);
        if address.is_empty() && country.is_none() {
            return Ok(None);
        }

        let resolution = self
            .resolver
            .resolve(&address, country.as_deref(), &self.field.lookup_services)
            .map_err(|e| self.failure(Stage::Lookup, e))?;
        let Some(resolution) = resolution else {
            debug!(field = %self.field.id, address, "no coordinates for address");
            return Ok(None);
        };

        let Some(source) = self.distance_source()? else {
            return Ok(None);
        };

        let query = DistanceQuery {
            reference: resolution.coords,
            source,
            ids: ids.to_vec(),
            direction,
            precision: self.field.precision,
        };
        let rows = self
            .store
            .query_distances(&query)
            .map_err(|e| self.failure(Stage::Query, e))?;
        if rows.is_empty() {
            return Ok(None);
        }

        let matched = self.record(ids, &rows);
        let matched_set: HashSet<RecordId> = matched.iter().copied().collect();

        let mut ranked = matched;
        ranked.extend(ids.iter().copied().filter(|id| !matched_set.contains(id)));

        debug!(
            field = %self.field.id,
            matched = matched_set.len(),
            total = ids.len(),
            provenance = %resolution.provenance,
            "ranked by distance"
        );
        Ok(Some(ranked))
    }

    /// Where the field's coordinates live, per data mode
    fn distance_source(&self) -> Result<Option<DistanceSource>, ResolutionError> {
        let attribute_failure = |e| self.failure(Stage::Attribute, e);

        match self.field.data_mode {
            Some(DataMode::Single) => {
                let attribute = self
                    .model
                    .require(self.field.single_attr_id.as_deref(), "single_attr_id")
                    .map_err(attribute_failure)?;
                if !attribute.kind.is_point() {
                    return Err(attribute_failure(Error::Attribute(format!(
                        "Attribute '{}' is not a geolocation attribute",
                        attribute.col_name
                    ))));
                }
                Ok(Some(DistanceSource::PointStore {
                    attribute_id: attribute.id.clone(),
                }))
            }
            Some(DataMode::Multi) => {
                let latitude = self
                    .model
                    .require(self.field.first_attr_id.as_deref(), "first_attr_id")
                    .map_err(attribute_failure)?;
                let longitude = self
                    .model
                    .require(self.field.second_attr_id.as_deref(), "second_attr_id")
                    .map_err(attribute_failure)?;
                Ok(Some(DistanceSource::RecordTable {
                    table: self.model.table_name.clone(),
                    lat_column: latitude.col_name.clone(),
                    lng_column: longitude.col_name.clone(),
                }))
            }
            None => Ok(None),
        }
    }

    /// Store row distances and return the ranked ids
    ///
    /// Keeps the first row per id and drops ids that were not requested.
    fn record(&self, ids: &[RecordId], rows: &[DistanceRow]) -> Vec<RecordId> {
        let requested: HashSet<RecordId> = ids.iter().copied().collect();
        let mut seen = HashSet::new();
        let mut matched = Vec::with_capacity(rows.len());

        let mut distances = self.distances.write().unwrap_or_else(|e| e.into_inner());
        let distances = distances.get_or_insert_with(HashMap::new);

        for row in rows {
            if requested.contains(&row.id) && seen.insert(row.id) {
                distances.insert(row.id, row.distance);
                matched.push(row.id);
            }
        }
        matched
    }

    fn failure(&self, stage: Stage, source: Error) -> ResolutionError {
        ResolutionError::new(self.field.id.clone(), stage, source)
    }

    fn degraded(&self, error: &ResolutionError) {
        warn!(field = %error.field_id, stage = %error.stage, error = %error.source, "distance ranking degraded to input order");
        if let Some(hook) = &self.on_degraded {
            hook(error);
        }
    }
}
