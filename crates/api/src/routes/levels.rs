//! Inventory level, adjustment and movement endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use inventory::{AdjustInventory, CreateInventoryLevel, UpdateInventoryLevel};
use ledger_store::{
    InventoryLevel, ItemId, LedgerStore, LevelQuery, LocationId, MovementQuery, StockMovement,
};
use serde::{Deserialize, Serialize};

use super::ApiJson;
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct LevelParams {
    pub inventory_item_id: Option<ItemId>,
    pub location_id: Option<LocationId>,
}

#[derive(Debug, Deserialize)]
pub struct MovementParams {
    pub inventory_item_id: Option<ItemId>,
    pub location_id: Option<LocationId>,
    pub limit: Option<usize>,
}

// -- Response types --

#[derive(Serialize)]
pub struct LevelsResponse {
    pub inventory_levels: Vec<InventoryLevel>,
}

#[derive(Serialize)]
pub struct LevelResponse {
    pub inventory_level: InventoryLevel,
}

#[derive(Serialize)]
pub struct MovementsResponse {
    pub movements: Vec<StockMovement>,
}

// -- Handlers --

/// GET /inventory/levels
#[tracing::instrument(skip(state))]
pub async fn list<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<LevelParams>,
) -> Result<Json<LevelsResponse>, ApiError> {
    let mut query = LevelQuery::new();
    if let Some(item_id) = params.inventory_item_id {
        query = query.inventory_item_id(item_id);
    }
    if let Some(location_id) = params.location_id {
        query = query.location_id(location_id);
    }
    let inventory_levels = state.service.list_levels(query).await?;
    Ok(Json(LevelsResponse { inventory_levels }))
}

/// POST /inventory/levels
#[tracing::instrument(skip(state))]
pub async fn create<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<CreateInventoryLevel>,
) -> Result<(StatusCode, Json<LevelResponse>), ApiError> {
    let inventory_level = state.service.create_level(input).await?;
    Ok((StatusCode::CREATED, Json(LevelResponse { inventory_level })))
}

/// PATCH /inventory/levels: partial update; 404 when the pair has no level.
#[tracing::instrument(skip(state))]
pub async fn update<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<UpdateInventoryLevel>,
) -> Result<Json<LevelResponse>, ApiError> {
    let inventory_level = state.service.update_level(input).await?;
    Ok(Json(LevelResponse { inventory_level }))
}

/// DELETE /inventory/levels?inventory_item_id&location_id
#[tracing::instrument(skip(state))]
pub async fn delete<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<LevelParams>,
) -> Result<StatusCode, ApiError> {
    let (Some(item_id), Some(location_id)) = (params.inventory_item_id, params.location_id) else {
        return Err(ApiError::BadRequest(
            "inventory_item_id and location_id are required".to_string(),
        ));
    };
    state.service.delete_level(item_id, location_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /inventory/adjustments: signed stock delta.
#[tracing::instrument(skip(state))]
pub async fn adjust<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(adjustment): ApiJson<AdjustInventory>,
) -> Result<Json<LevelResponse>, ApiError> {
    let inventory_level = state
        .service
        .adjust_inventory(
            adjustment.inventory_item_id,
            adjustment.location_id,
            adjustment.delta,
        )
        .await?;
    Ok(Json(LevelResponse { inventory_level }))
}

/// GET /inventory/movements: the append-only movement log.
#[tracing::instrument(skip(state))]
pub async fn movements<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<MovementParams>,
) -> Result<Json<MovementsResponse>, ApiError> {
    let mut query = MovementQuery::new();
    if let Some(item_id) = params.inventory_item_id {
        query = query.inventory_item_id(item_id);
    }
    if let Some(location_id) = params.location_id {
        query = query.location_id(location_id);
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    let movements = state.service.list_movements(query).await?;
    Ok(Json(MovementsResponse { movements }))
}
