use super::*;
use crate::coord::Coordinates;
use crate::error::Result;
use crate::field::{Attribute, AttributeKind, LookupService};
use crate::geo::registry::ProviderRegistry;
use crate::geo::{LookupProvider, LookupResult};
use crate::request::RequestParams;
use crate::store::memory::{MemoryStore, RecordRow};
use crate::store::{CacheEntry, CacheStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Resolves every address to the same point
struct FixedProvider {
    result: LookupResult,
    calls: AtomicUsize,
}

impl LookupProvider for FixedProvider {
    fn description(&self) -> &str {
        "fixed"
    }

    fn get_coordinates(
        &self,
        _country: Option<&str>,
        _address: Option<&str>,
        _api_token: Option<&str>,
    ) -> Result<LookupResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

/// Distance store that always fails
struct BrokenStore;

impl DistanceStore for BrokenStore {
    fn query_distances(&self, _query: &DistanceQuery) -> Result<Vec<DistanceRow>> {
        Err(Error::Store("connection refused".to_string()))
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    provider: Arc<FixedProvider>,
    cache: CoordinateCache,
}

fn fixture(result: LookupResult) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    store.add_point(1, "7", Coordinates::new(52.045, 13.0)).unwrap();
    store.add_point(2, "7", Coordinates::new(52.018, 13.0)).unwrap();
    store
        .add_record("mm_stores", RecordRow::new(1).with_column("lat", 52.045).with_column("lng", 13.0))
        .unwrap();
    store
        .add_record("mm_stores", RecordRow::new(2).with_column("lat", 52.018).with_column("lng", 13.0))
        .unwrap();
    store
        .add_record("mm_stores", RecordRow::new(3).with_column("lat", serde_json::Value::Null))
        .unwrap();

    let provider = Arc::new(FixedProvider {
        result,
        calls: AtomicUsize::new(0),
    });
    let mut registry = ProviderRegistry::new();
    registry.register("fixed", provider.clone());

    let cache = CoordinateCache::new(store.clone(), Arc::new(registry));
    Fixture {
        store,
        provider,
        cache,
    }
}

fn model() -> Arc<RecordModel> {
    Arc::new(
        RecordModel::new("mm_stores")
            .with_attribute(Attribute::new("7", "location", AttributeKind::Geolocation))
            .with_attribute(Attribute::new("8", "lat", AttributeKind::Numeric))
            .with_attribute(Attribute::new("9", "lng", AttributeKind::Numeric)),
    )
}

fn single_field() -> FieldConfiguration {
    FieldConfiguration::new("distance")
        .with_get_param("geo")
        .with_lookup_service(LookupService::new("fixed"))
        .with_single_attribute("7")
}

fn engine(fixture: &Fixture, field: FieldConfiguration) -> RankingEngine {
    RankingEngine::new(field, model(), fixture.cache.clone(), fixture.store.clone())
}

fn request() -> RequestParams {
    RequestParams::new().with_get("geo", "Berlin")
}

fn found() -> LookupResult {
    LookupResult::found(52.0, 13.0)
}

#[test]
fn test_sort_ascending() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    let sorted = engine.sort_ids(&[1, 2, 3, 4], SortDirection::Asc, &request());
    assert_eq!(sorted, vec![2, 1, 3, 4]);
}

#[test]
fn test_sort_descending() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    let sorted = engine.sort_ids(&[1, 2, 3, 4], SortDirection::Desc, &request());
    assert_eq!(sorted, vec![1, 2, 3, 4]);
}

#[test]
fn test_unmatched_keep_input_order() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    let sorted = engine.sort_ids(&[4, 1, 3, 2], SortDirection::Asc, &request());
    assert_eq!(sorted, vec![2, 1, 4, 3]);
}

#[test]
fn test_result_is_permutation() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    let ids = vec![9, 2, 7, 1, 3];
    let mut sorted = engine.sort_ids(&ids, SortDirection::Desc, &request());
    sorted.sort_unstable();
    let mut expected = ids.clone();
    expected.sort_unstable();
    assert_eq!(sorted, expected);
}

#[test]
fn test_multi_mode_ranks_by_columns() {
    let fixture = fixture(found());
    let field = FieldConfiguration::new("distance")
        .with_get_param("geo")
        .with_lookup_service(LookupService::new("fixed"))
        .with_attribute_pair("lat", "lng");
    let engine = engine(&fixture, field);

    let sorted = engine.sort_ids(&[1, 2, 3, 4], SortDirection::Asc, &request());
    assert_eq!(sorted, vec![2, 1, 3, 4]);

    let data = engine.get_data_for(&[1, 2, 3], &request());
    assert_eq!(data[&1], 5.0);
    assert_eq!(data[&2], 2.0);
    assert_eq!(data[&3], -1.0);
}

#[test]
fn test_empty_ids() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    assert!(engine.sort_ids(&[], SortDirection::Asc, &request()).is_empty());
    assert_eq!(fixture.provider.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unconfigured_field_keeps_order() {
    let fixture = fixture(found());
    let field = FieldConfiguration::new("distance")
        .with_get_param("geo")
        .with_single_attribute("7");
    let engine = engine(&fixture, field);

    let sorted = engine.sort_ids(&[1, 2, 3], SortDirection::Asc, &request());
    assert_eq!(sorted, vec![1, 2, 3]);
    assert_eq!(fixture.provider.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_missing_address_keeps_order() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    let sorted = engine.sort_ids(&[1, 2, 3], SortDirection::Asc, &RequestParams::new());
    assert_eq!(sorted, vec![1, 2, 3]);
    assert_eq!(fixture.provider.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_country_alone_is_enough() {
    let fixture = fixture(found());
    let field = single_field().with_country_preset("DE");
    let engine = engine(&fixture, field);

    let sorted = engine.sort_ids(&[1, 2], SortDirection::Asc, &RequestParams::new());
    assert_eq!(sorted, vec![2, 1]);
    assert_eq!(fixture.store.cache_entries().unwrap()[0].country, "DE");
}

#[test]
fn test_address_not_found_keeps_order() {
    let fixture = fixture(LookupResult::failed("ZERO_RESULTS"));
    let engine = engine(&fixture, single_field());

    let sorted = engine.sort_ids(&[1, 2, 3], SortDirection::Asc, &request());
    assert_eq!(sorted, vec![1, 2, 3]);
    assert!(engine.cached_distances().is_empty());
}

#[test]
fn test_cached_reference_skips_providers() {
    let fixture = fixture(found());
    fixture
        .store
        .insert(CacheEntry::new("Berlin", "", Coordinates::new(52.0, 13.0), "provider:fixed"))
        .unwrap();
    let engine = engine(&fixture, single_field());

    let sorted = engine.sort_ids(&[1, 2], SortDirection::Asc, &request());
    assert_eq!(sorted, vec![2, 1]);
    assert_eq!(fixture.provider.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_store_failure_reports_degradation() {
    let fixture = fixture(found());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let hook_seen = seen.clone();

    let engine = RankingEngine::new(single_field(), model(), fixture.cache.clone(), Arc::new(BrokenStore))
        .with_degradation_hook(Arc::new(move |e: &ResolutionError| {
            hook_seen.lock().unwrap().push((e.field_id.clone(), e.stage));
        }));

    let sorted = engine.sort_ids(&[3, 1, 2], SortDirection::Asc, &request());
    assert_eq!(sorted, vec![3, 1, 2]);
    assert_eq!(*seen.lock().unwrap(), vec![("distance".to_string(), Stage::Query)]);
}

#[test]
fn test_non_point_attribute_reports_degradation() {
    let fixture = fixture(found());
    let seen = Arc::new(AtomicUsize::new(0));
    let hook_seen = seen.clone();

    let field = single_field().with_single_attribute("lat");
    let engine = engine(&fixture, field).with_degradation_hook(Arc::new(move |e: &ResolutionError| {
        assert_eq!(e.stage, Stage::Attribute);
        hook_seen.fetch_add(1, Ordering::SeqCst);
    }));

    let sorted = engine.sort_ids(&[1, 2], SortDirection::Asc, &request());
    assert_eq!(sorted, vec![1, 2]);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_get_data_for_sentinel() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    let data = engine.get_data_for(&[1, 2, 3, 4], &request());
    assert_eq!(data.len(), 4);
    assert_eq!(data[&1], 5.0);
    assert_eq!(data[&2], 2.0);
    assert_eq!(data[&3], -1.0);
    assert_eq!(data[&4], -1.0);
}

#[test]
fn test_get_data_for_uses_sort_results() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    engine.sort_ids(&[1, 2], SortDirection::Desc, &request());
    let calls = fixture.provider.calls.load(Ordering::SeqCst);

    let data = engine.get_data_for(&[1, 2], &RequestParams::new());
    assert_eq!(data[&2], 2.0);
    assert_eq!(fixture.provider.calls.load(Ordering::SeqCst), calls);
}

#[test]
fn test_distances_computed_once() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    // first call only covers record 2
    let first = engine.get_data_for(&[2], &request());
    assert_eq!(first[&2], 2.0);

    // record 1 has a distance, but the stored results are served as they are
    let second = engine.get_data_for(&[1, 2], &request());
    assert_eq!(second[&1], -1.0);
    assert_eq!(second[&2], 2.0);
}

#[test]
fn test_failed_run_still_marks_populated() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    let data = engine.get_data_for(&[1, 2], &RequestParams::new());
    assert_eq!(data[&1], -1.0);
    assert_eq!(data[&2], -1.0);

    let data = engine.get_data_for(&[1, 2], &request());
    assert_eq!(data[&1], -1.0);
}

#[test]
fn test_invalidate_recomputes() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    engine.get_data_for(&[2], &request());
    engine.invalidate();
    assert!(engine.cached_distances().is_empty());

    let data = engine.get_data_for(&[1, 2], &request());
    assert_eq!(data[&1], 5.0);
    assert_eq!(data[&2], 2.0);
}

#[test]
fn test_failed_sort_not_repeated_by_get_data_for() {
    let fixture = fixture(LookupResult::failed("ZERO_RESULTS"));
    let engine = engine(&fixture, single_field());

    let sorted = engine.sort_ids(&[1, 2, 3], SortDirection::Asc, &request());
    assert_eq!(fixture.provider.calls.load(Ordering::SeqCst), 1);

    let data = engine.get_data_for(&sorted, &request());
    assert_eq!(fixture.provider.calls.load(Ordering::SeqCst), 1);
    assert!(data.values().all(|d| *d == -1.0));
}

#[test]
fn test_degraded_sort_reported_once_per_request() {
    let fixture = fixture(found());
    let seen = Arc::new(AtomicUsize::new(0));
    let hook_seen = seen.clone();

    let engine = RankingEngine::new(single_field(), model(), fixture.cache.clone(), Arc::new(BrokenStore))
        .with_degradation_hook(Arc::new(move |_: &ResolutionError| {
            hook_seen.fetch_add(1, Ordering::SeqCst);
        }));

    let sorted = engine.sort_ids(&[1, 2], SortDirection::Asc, &request());
    engine.get_data_for(&sorted, &request());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_empty_sort_leaves_distances_unpopulated() {
    let fixture = fixture(found());
    let engine = engine(&fixture, single_field());

    engine.sort_ids(&[], SortDirection::Asc, &request());
    let data = engine.get_data_for(&[1, 2], &request());
    assert_eq!(data[&2], 2.0);
}
