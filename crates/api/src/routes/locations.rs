//! Location endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use inventory::CreateLocation;
use ledger_store::{InventoryLocation, LedgerStore, LocationId, LocationUpdate};
use serde::Serialize;

use super::ApiJson;
use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct LocationsResponse {
    pub locations: Vec<InventoryLocation>,
}

#[derive(Serialize)]
pub struct LocationResponse {
    pub location: InventoryLocation,
}

/// GET /locations
#[tracing::instrument(skip(state))]
pub async fn list<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<LocationsResponse>, ApiError> {
    let locations = state.service.list_locations().await?;
    Ok(Json(LocationsResponse { locations }))
}

/// POST /locations
#[tracing::instrument(skip(state, input))]
pub async fn create<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<CreateLocation>,
) -> Result<(StatusCode, Json<LocationResponse>), ApiError> {
    let location = state.service.create_location(input).await?;
    Ok((StatusCode::CREATED, Json(LocationResponse { location })))
}

/// GET /locations/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<LocationId>,
) -> Result<Json<LocationResponse>, ApiError> {
    let location = state.service.retrieve_location(id).await?;
    Ok(Json(LocationResponse { location }))
}

/// PATCH /locations/{id}
#[tracing::instrument(skip(state, update))]
pub async fn update<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<LocationId>,
    ApiJson(update): ApiJson<LocationUpdate>,
) -> Result<Json<LocationResponse>, ApiError> {
    let location = state.service.update_location(id, update).await?;
    Ok(Json(LocationResponse { location }))
}
