//! Lifecycle event ingestion.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use ledger_store::LedgerStore;
use serde::Serialize;
use subscribers::HandlerReport;

use super::ApiJson;
use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct DispatchResponse {
    pub reports: Vec<HandlerReport>,
}

/// POST /events: deliver a lifecycle event to the subscribers.
///
/// Per-line failures are reported in the body; the producer decides
/// whether to redeliver.
#[tracing::instrument(skip(state, payload))]
pub async fn ingest<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(payload): ApiJson<serde_json::Value>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let reports = state.dispatcher.dispatch_json(payload).await?;
    Ok(Json(DispatchResponse { reports }))
}
