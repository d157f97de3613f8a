//! Inventory item endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use inventory::{CreateInventoryItem, InventoryItemSummary};
use ledger_store::{
    InventoryItem, ItemId, ItemQuery, ItemUpdate, LedgerStore, LevelQuery, LocationId, VariantId,
};
use serde::{Deserialize, Serialize};

use super::ApiJson;
use crate::AppState;
use crate::error::ApiError;

pub const DEFAULT_LIMIT: usize = 50;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub variant_id: Option<VariantId>,
    pub sku: Option<String>,
    pub location_id: Option<LocationId>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
    /// Comma-separated location IDs; all locations when absent.
    pub location_id: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ListResponse {
    pub inventory_items: Vec<InventoryItemSummary>,
    pub count: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub inventory_item: InventoryItem,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub inventory_item: InventoryItemSummary,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub id: ItemId,
    pub deleted: bool,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub inventory_item_id: ItemId,
    pub stocked_quantity: i64,
    pub reserved_quantity: i64,
    pub available_quantity: i64,
}

// -- Handlers --

/// GET /inventory: paginated items with their levels and totals.
#[tracing::instrument(skip(state))]
pub async fn list<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let mut query = ItemQuery::new().limit(limit).offset(offset);
    if let Some(variant_id) = params.variant_id {
        query = query.variant_id(variant_id);
    }
    if let Some(sku) = params.sku {
        query = query.sku(sku);
    }
    if let Some(location_id) = params.location_id {
        query = query.location_id(location_id);
    }

    let count = state.service.count_items(query.clone()).await?;
    let inventory_items = state.service.list_items_with_levels(query).await?;

    Ok(Json(ListResponse {
        inventory_items,
        count,
        limit,
        offset,
    }))
}

/// POST /inventory: create an item. `sku` is required.
#[tracing::instrument(skip(state, input))]
pub async fn create<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<CreateInventoryItem>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let inventory_item = state.service.create_item(input).await?;
    Ok((StatusCode::CREATED, Json(ItemResponse { inventory_item })))
}

/// GET /inventory/{id}: one item with its levels.
#[tracing::instrument(skip(state))]
pub async fn get<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ItemId>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let item = state.service.retrieve_item(id).await?;
    let levels = state.service.list_levels(LevelQuery::for_item(id)).await?;
    Ok(Json(SummaryResponse {
        inventory_item: InventoryItemSummary::new(item, levels)?,
    }))
}

/// PATCH /inventory/{id}
#[tracing::instrument(skip(state, update))]
pub async fn update<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ItemId>,
    ApiJson(update): ApiJson<ItemUpdate>,
) -> Result<Json<ItemResponse>, ApiError> {
    let inventory_item = state.service.update_item(id, update).await?;
    Ok(Json(ItemResponse { inventory_item }))
}

/// DELETE /inventory/{id}: refused while reservations hold the item.
#[tracing::instrument(skip(state))]
pub async fn delete<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ItemId>,
) -> Result<Json<DeletedResponse>, ApiError> {
    state.service.delete_item(id).await?;
    Ok(Json(DeletedResponse { id, deleted: true }))
}

/// GET /inventory/{id}/available?location_id=a,b
#[tracing::instrument(skip(state))]
pub async fn available<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ItemId>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let location_ids = params
        .location_id
        .as_deref()
        .map(parse_location_ids)
        .transpose()?;
    let locations = location_ids.as_deref();

    Ok(Json(AvailabilityResponse {
        inventory_item_id: id,
        stocked_quantity: state.service.get_stocked_quantity(id, locations).await?,
        reserved_quantity: state.service.get_reserved_quantity(id, locations).await?,
        available_quantity: state.service.get_available_quantity(id, locations).await?,
    }))
}

fn parse_location_ids(raw: &str) -> Result<Vec<LocationId>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|e| ApiError::BadRequest(format!("Invalid location_id '{s}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_locations() {
        let a = LocationId::new();
        let b = LocationId::new();
        let parsed = parse_location_ids(&format!("{a}, {b},")).unwrap();
        assert_eq!(parsed, vec![a, b]);
    }

    #[test]
    fn rejects_malformed_location() {
        assert!(matches!(
            parse_location_ids("not-a-uuid"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
