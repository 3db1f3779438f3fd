//! HTTP API routes
//!
//! Defines all REST API endpoints for the server.

use crate::error::Error;
use crate::field::RecordId;
use crate::geo::registry::ProviderInfo;
use crate::request::RequestParams;
use crate::server::state::AppState;
use crate::store::SortDirection;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/providers", get(providers_handler))
        .route(
            "/api/fields/:field/rank",
            get(rank_get_handler).post(rank_post_handler),
        )
        .route("/api/fields/:field/distances", get(distances_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidCoordinates(_) => "INVALID_COORDINATES",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Geocoding(_) => "GEOCODING_ERROR",
            Error::Store(_) => "STORE_ERROR",
            _ => "INTERNAL_ERROR",
        };
        ApiError::new(code, err.to_string())
    }
}

type HandlerError = (StatusCode, Json<ApiError>);

fn unknown_field(field: &str) -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new("UNKNOWN_FIELD", format!("Unknown field: {}", field))),
    )
}

fn bad_request(err: ApiError) -> HandlerError {
    (StatusCode::BAD_REQUEST, Json(err))
}

fn internal(err: Error) -> HandlerError {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiError::from(err)))
}

/// Parse the comma-separated `ids` parameter; absent means no ids
fn parse_ids(params: &HashMap<String, String>) -> Result<Vec<RecordId>, ApiError> {
    let Some(raw) = params.get("ids") else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<RecordId>()
                .map_err(|_| ApiError::new("INVALID_IDS", format!("Invalid record id: {}", s)))
        })
        .collect()
}

fn parse_direction(params: &HashMap<String, String>) -> Result<SortDirection, ApiError> {
    match params.get("direction") {
        Some(raw) => raw
            .parse()
            .map_err(|e: String| ApiError::new("INVALID_DIRECTION", e)),
        None => Ok(SortDirection::default()),
    }
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server is running
    pub running: bool,
    /// Server version
    pub version: String,
    /// Configured distance fields
    pub fields: Vec<String>,
    /// Registered lookup providers
    pub providers: Vec<String>,
    /// Ranking runs that fell back to the input order
    pub degraded_runs: u64,
    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        fields: state.field_ids().await,
        providers: state
            .registry()
            .names()
            .into_iter()
            .map(String::from)
            .collect(),
        degraded_runs: state.degraded_runs(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Providers list response
#[derive(Debug, Serialize, Deserialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderInfo>,
}

/// List registered lookup providers
///
/// GET /api/providers
async fn providers_handler(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.registry().available_providers(),
    })
}

/// Ranking response
#[derive(Debug, Serialize, Deserialize)]
pub struct RankResponse {
    pub field: String,
    /// Ids in ranked order
    pub ids: Vec<RecordId>,
    /// Distance per id in kilometers, -1 when unknown
    pub distances: BTreeMap<RecordId, f64>,
}

/// Rank ids by distance to the request's address
///
/// GET /api/fields/:field/rank?ids=1,2,3&direction=asc&<params>
async fn rank_get_handler(
    State(state): State<Arc<AppState>>,
    Path(field): Path<String>,
    Query(get): Query<HashMap<String, String>>,
) -> Result<Json<RankResponse>, HandlerError> {
    rank(state, field, get, HashMap::new()).await
}

/// Same as the GET variant; the form body supplies POST parameters
///
/// POST /api/fields/:field/rank?ids=1,2,3&direction=asc&<params>
async fn rank_post_handler(
    State(state): State<Arc<AppState>>,
    Path(field): Path<String>,
    Query(get): Query<HashMap<String, String>>,
    Form(post): Form<HashMap<String, String>>,
) -> Result<Json<RankResponse>, HandlerError> {
    rank(state, field, get, post).await
}

async fn rank(
    state: Arc<AppState>,
    field: String,
    get: HashMap<String, String>,
    post: HashMap<String, String>,
) -> Result<Json<RankResponse>, HandlerError> {
    let engine = state
        .engine(&field)
        .await
        .ok_or_else(|| unknown_field(&field))?;
    let ids = parse_ids(&get).map_err(bad_request)?;
    let direction = parse_direction(&get).map_err(bad_request)?;
    let request = RequestParams::from_maps(get, post);

    let (ids, distances) = tokio::task::spawn_blocking(move || {
        let ranked = engine.sort_ids(&ids, direction, &request);
        let distances = engine.get_data_for(&ranked, &request);
        (ranked, distances)
    })
    .await
    .map_err(|e| internal(Error::Server(format!("Ranking task failed: {}", e))))?;

    Ok(Json(RankResponse {
        field,
        ids,
        distances,
    }))
}

/// Distances response
#[derive(Debug, Serialize, Deserialize)]
pub struct DistancesResponse {
    pub field: String,
    pub distances: BTreeMap<RecordId, f64>,
}

/// Distance per id without reordering
///
/// GET /api/fields/:field/distances?ids=1,2,3&<params>
async fn distances_handler(
    State(state): State<Arc<AppState>>,
    Path(field): Path<String>,
    Query(get): Query<HashMap<String, String>>,
) -> Result<Json<DistancesResponse>, HandlerError> {
    let engine = state
        .engine(&field)
        .await
        .ok_or_else(|| unknown_field(&field))?;
    let ids = parse_ids(&get).map_err(bad_request)?;
    let request = RequestParams::from_maps(get, HashMap::new());

    let distances = tokio::task::spawn_blocking(move || engine.get_data_for(&ids, &request))
        .await
        .map_err(|e| internal(Error::Server(format!("Distance task failed: {}", e))))?;

    Ok(Json(DistancesResponse { field, distances }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::coord::Coordinates;
    use crate::field::{Attribute, AttributeKind, FieldConfiguration, LookupService, RecordModel};
    use crate::geo::registry::ProviderRegistry;
    use crate::geo::{LookupProvider, LookupResult};
    use crate::store::memory::MemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    struct FixedProvider;

    impl LookupProvider for FixedProvider {
        fn description(&self) -> &str {
            "Always (52.0, 13.0)"
        }

        fn get_coordinates(
            &self,
            _country: Option<&str>,
            _address: Option<&str>,
            _api_token: Option<&str>,
        ) -> crate::error::Result<LookupResult> {
            Ok(LookupResult::found(52.0, 13.0))
        }
    }

    fn create_test_state() -> (Arc<AppState>, Arc<MemoryStore>) {
        let mut config = Config::default();
        config.model = RecordModel::new("mm_stores")
            .with_attribute(Attribute::new("7", "location", AttributeKind::Geolocation));
        config.fields.push(
            FieldConfiguration::new("near")
                .with_get_param("geo")
                .with_country_param("country")
                .with_lookup_service(LookupService::new("fixed"))
                .with_single_attribute("7"),
        );

        let store = Arc::new(MemoryStore::new());
        store.add_point(1, "7", Coordinates::new(52.045, 13.0)).unwrap();
        store.add_point(2, "7", Coordinates::new(52.018, 13.0)).unwrap();

        let mut registry = ProviderRegistry::new();
        registry.register("fixed", Arc::new(FixedProvider));

        let state = AppState::with_registry(config, registry, store.clone(), store.clone()).unwrap();
        (Arc::new(state), store)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (state, _store) = create_test_state();
        let (status, body): (_, StatusResponse) = get_json(create_router(state), "/api/status").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.running);
        assert_eq!(body.fields, vec!["near"]);
        assert_eq!(body.providers, vec!["fixed"]);
        assert_eq!(body.degraded_runs, 0);
    }

    #[tokio::test]
    async fn test_providers_endpoint() {
        let (state, _store) = create_test_state();
        let (status, body): (_, ProvidersResponse) =
            get_json(create_router(state), "/api/providers").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.providers.len(), 1);
        assert_eq!(body.providers[0].name, "fixed");
    }

    #[tokio::test]
    async fn test_rank_ascending() {
        let (state, _store) = create_test_state();
        let (status, body): (_, RankResponse) =
            get_json(create_router(state), "/api/fields/near/rank?ids=1,2,3,4&geo=Berlin").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.field, "near");
        assert_eq!(body.ids, vec![2, 1, 3, 4]);
        assert_eq!(body.distances[&1], 5.0);
        assert_eq!(body.distances[&2], 2.0);
        assert_eq!(body.distances[&3], -1.0);
        assert_eq!(body.distances[&4], -1.0);
    }

    #[tokio::test]
    async fn test_rank_descending() {
        let (state, _store) = create_test_state();
        let (_, body): (_, RankResponse) = get_json(
            create_router(state),
            "/api/fields/near/rank?ids=1,2,3,4&direction=desc&geo=Berlin",
        )
        .await;

        assert_eq!(body.ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_rank_without_address_keeps_order() {
        let (state, _store) = create_test_state();
        let (_, body): (_, RankResponse) =
            get_json(create_router(state), "/api/fields/near/rank?ids=3,1,2").await;

        assert_eq!(body.ids, vec![3, 1, 2]);
        assert!(body.distances.values().all(|d| *d == -1.0));
    }

    #[tokio::test]
    async fn test_rank_post_country() {
        let (state, store) = create_test_state();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/fields/near/rank?ids=1,2&geo=Berlin")
                    .header("Content-Type", "application/x-www-form-urlencoded")
                    .body(Body::from("country=DE"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let rank: RankResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(rank.ids, vec![2, 1]);

        let entries = store.cache_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].search, "Berlin");
        assert_eq!(entries[0].country, "DE");
    }

    #[tokio::test]
    async fn test_results_do_not_leak_between_requests() {
        let (state, _store) = create_test_state();

        let (_, first): (_, DistancesResponse) =
            get_json(create_router(state.clone()), "/api/fields/near/distances?ids=2&geo=Berlin").await;
        assert_eq!(first.distances[&2], 2.0);

        let (_, second): (_, DistancesResponse) =
            get_json(create_router(state), "/api/fields/near/distances?ids=1,2&geo=Berlin").await;
        assert_eq!(second.distances[&1], 5.0);
        assert_eq!(second.distances[&2], 2.0);
    }

    #[tokio::test]
    async fn test_unknown_field() {
        let (state, _store) = create_test_state();
        let (status, err): (_, ApiError) =
            get_json(create_router(state), "/api/fields/far/rank?ids=1").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "UNKNOWN_FIELD");
    }

    #[tokio::test]
    async fn test_invalid_ids() {
        let (state, _store) = create_test_state();
        let (status, err): (_, ApiError) =
            get_json(create_router(state), "/api/fields/near/rank?ids=1,x").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_IDS");
    }

    #[tokio::test]
    async fn test_invalid_direction() {
        let (state, _store) = create_test_state();
        let (status, err): (_, ApiError) =
            get_json(create_router(state), "/api/fields/near/rank?ids=1&direction=up").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_DIRECTION");
    }

    #[test]
    fn test_parse_ids() {
        let mut params = HashMap::new();
        assert!(parse_ids(&params).unwrap().is_empty());

        params.insert("ids".to_string(), " 4, 2 ,,9".to_string());
        assert_eq!(parse_ids(&params).unwrap(), vec![4, 2, 9]);

        params.insert("ids".to_string(), "-1".to_string());
        assert!(parse_ids(&params).is_err());
    }
}
