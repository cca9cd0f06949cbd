use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::geojson::{Feature, FeatureCollection, FeatureError, FeatureInput, WithDistance};
use crate::search::{self, NearbyParams, SearchError};
use crate::store::{EntityId, Restaurant, StoreError, UserLocation};

use super::state::{AppState, Resource};

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

#[derive(Debug)]
pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_server_error() {
            error!(status = self.0.as_u16(), "{}", self.1);
        }
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => api_error(StatusCode::NOT_FOUND, "Not found."),
            StoreError::Invalid(v) => api_error(StatusCode::BAD_REQUEST, v.to_string()),
            StoreError::Unavailable(_) | StoreError::Persist { .. } => {
                api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            StoreError::Load { .. } => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::InvalidCoordinate | SearchError::InvalidDistance => {
                api_error(StatusCode::BAD_REQUEST, e.to_string())
            }
            SearchError::StoreUnavailable(inner) => inner.into(),
        }
    }
}

impl From<FeatureError> for ApiError {
    fn from(e: FeatureError) -> Self {
        api_error(StatusCode::BAD_REQUEST, e.to_string())
    }
}

// An id that is not a number cannot name a record.
impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        debug!("rejected path: {e}");
        api_error(StatusCode::NOT_FOUND, "Not found.")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        api_error(e.status(), e.body_text())
    }
}

// ─── GET /api/ ───────────────────────────────────────────────────

pub async fn api_root() -> Json<Value> {
    Json(json!({
        (UserLocation::PATH): format!("/api/{}/", UserLocation::PATH),
        (Restaurant::PATH): format!("/api/{}/", Restaurant::PATH),
    }))
}

// ─── GET /api/restaurants/nearby/ ────────────────────────────────

pub async fn nearby_restaurants(
    State(state): State<Arc<AppState>>,
    params: Result<Query<NearbyParams>, QueryRejection>,
) -> Result<Json<FeatureCollection<WithDistance<Restaurant>>>, ApiError> {
    let start = Instant::now();

    // A query string that does not deserialize carries no usable coordinates.
    let params = params.map(|Query(p)| p).unwrap_or_else(|e| {
        debug!("rejected query: {e}");
        NearbyParams::default()
    });

    let result = search::search(&state.restaurants, &params, state.default_max_distance);

    info!(
        lat = params.lat.as_deref().unwrap_or_default(),
        lng = params.lng.as_deref().unwrap_or_default(),
        max_distance = params.max_distance.as_deref().unwrap_or("default"),
        hits = result.as_ref().map_or(0, Vec::len),
        error = result.as_ref().err().map(tracing::field::display),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/restaurants/nearby/"
    );

    Ok(Json(result?.into_iter().map(Feature::from).collect()))
}

// ─── /api/<resource>/ ────────────────────────────────────────────

pub async fn list<T: Resource>(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FeatureCollection<T>>, ApiError> {
    let collection = T::shared(&state).read()?;
    Ok(Json(
        collection.list().cloned().map(Feature::from).collect(),
    ))
}

pub async fn create<T: Resource>(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FeatureInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Feature<T>>), ApiError> {
    let Json(body) = body?;
    let (location, entity) = body.into_parts::<T>()?;
    let record = T::shared(&state).write()?.create(location, entity)?;
    info!(resource = T::PATH, id = record.id, "created");
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn retrieve<T: Resource>(
    State(state): State<Arc<AppState>>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<Feature<T>>, ApiError> {
    let Path(id) = id?;
    let record = T::shared(&state).read()?.get(id)?.clone();
    Ok(Json(record.into()))
}

pub async fn update<T: Resource>(
    State(state): State<Arc<AppState>>,
    id: Result<Path<EntityId>, PathRejection>,
    body: Result<Json<FeatureInput>, JsonRejection>,
) -> Result<Json<Feature<T>>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let (location, entity) = body.into_parts::<T>()?;
    let record = T::shared(&state).write()?.replace(id, location, entity)?;
    info!(resource = T::PATH, id, "updated");
    Ok(Json(record.into()))
}

pub async fn partial_update<T: Resource>(
    State(state): State<Arc<AppState>>,
    id: Result<Path<EntityId>, PathRejection>,
    body: Result<Json<FeatureInput>, JsonRejection>,
) -> Result<Json<Feature<T>>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let mut collection = T::shared(&state).write()?;
    let (location, entity) = body.merge_into(collection.get(id)?)?;
    let record = collection.replace(id, location, entity)?;
    info!(resource = T::PATH, id, "updated");
    Ok(Json(record.into()))
}

pub async fn destroy<T: Resource>(
    State(state): State<Arc<AppState>>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    T::shared(&state).write()?.delete(id)?;
    info!(resource = T::PATH, id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}
