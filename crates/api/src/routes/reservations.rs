//! Reservation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use inventory::{CreateReservation, ResolvedReservation};
use ledger_store::{
    ItemId, LedgerStore, LocationId, OrderId, ReservationId, ReservationItem, ReservationQuery,
};
use serde::{Deserialize, Serialize};

use super::ApiJson;
use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub external_id: Option<OrderId>,
    pub inventory_item_id: Option<ItemId>,
    pub location_id: Option<LocationId>,
}

#[derive(Serialize)]
pub struct ReservationsResponse {
    pub reservations: Vec<ReservationItem>,
}

#[derive(Serialize)]
pub struct ReservationResponse {
    pub reservation: ReservationItem,
}

/// GET /reservations
#[tracing::instrument(skip(state))]
pub async fn list<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ReservationsResponse>, ApiError> {
    let mut query = match params.external_id {
        Some(external_id) => ReservationQuery::for_external_id(external_id),
        None => ReservationQuery::new(),
    };
    if let Some(item_id) = params.inventory_item_id {
        query = query.inventory_item_id(item_id);
    }
    if let Some(location_id) = params.location_id {
        query = query.location_id(location_id);
    }
    let reservations = state.service.list_reservations(query).await?;
    Ok(Json(ReservationsResponse { reservations }))
}

/// POST /reservations: 409 with available and requested quantities when
/// the level cannot cover the hold.
#[tracing::instrument(skip(state, input))]
pub async fn create<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(input): ApiJson<CreateReservation>,
) -> Result<(StatusCode, Json<ReservationResponse>), ApiError> {
    let reservation = state.service.create_reservation(input).await?;
    Ok((StatusCode::CREATED, Json(ReservationResponse { reservation })))
}

/// GET /reservations/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ReservationId>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation = state.service.retrieve_reservation(id).await?;
    Ok(Json(ReservationResponse { reservation }))
}

/// DELETE /reservations/{id}: release the hold.
#[tracing::instrument(skip(state))]
pub async fn release<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ReservationId>,
) -> Result<Json<ResolvedReservation>, ApiError> {
    Ok(Json(state.service.delete_reservation(id).await?))
}

/// POST /reservations/{id}/confirm: consume the hold.
#[tracing::instrument(skip(state))]
pub async fn confirm<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<ReservationId>,
) -> Result<Json<ResolvedReservation>, ApiError> {
    Ok(Json(state.service.confirm_reservation(id).await?))
}
