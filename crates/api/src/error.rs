//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inventory::InventoryError;
use saga::SagaError;
use subscribers::SubscriberError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request from the client.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error(transparent)]
    Saga(#[from] SagaError),

    #[error(transparent)]
    Subscriber(#[from] SubscriberError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Inventory(err) => inventory_status(err),
            ApiError::Saga(SagaError::Inventory(err)) => inventory_status(err),
            ApiError::Saga(SagaError::InvalidState { .. }) => StatusCode::CONFLICT,
            ApiError::Saga(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Subscriber(SubscriberError::Deserialization(_)) => StatusCode::BAD_REQUEST,
            ApiError::Subscriber(SubscriberError::Inventory(err)) => inventory_status(err),
            ApiError::Subscriber(SubscriberError::Saga(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn inventory_status(err: &InventoryError) -> StatusCode {
    match err {
        InventoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        InventoryError::InsufficientInventory { .. } | InventoryError::Conflict(_) => {
            StatusCode::CONFLICT
        }
        InventoryError::Validation(_) => StatusCode::BAD_REQUEST,
        InventoryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::{ItemId, LedgerStoreError, LocationId};

    #[test]
    fn maps_inventory_errors() {
        let not_found = ApiError::Inventory(InventoryError::NotFound {
            entity: "inventory level",
            id: "x".to_string(),
        });
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let insufficient = ApiError::Inventory(InventoryError::InsufficientInventory {
            item_id: ItemId::new(),
            location_id: LocationId::new(),
            available: 0,
            requested: 1,
        });
        assert_eq!(insufficient.status(), StatusCode::CONFLICT);
        assert!(insufficient.to_string().contains("available 0, requested 1"));

        let validation = ApiError::Inventory(InventoryError::Validation("bad".to_string()));
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let store = ApiError::Inventory(InventoryError::Store(LedgerStoreError::InvalidRecord(
            "bad row".to_string(),
        )));
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn compensation_failure_is_internal() {
        let err = ApiError::Saga(SagaError::CompensationFailed {
            step: "create_reservation".to_string(),
            reason: "store down".to_string(),
            pending: Vec::new(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
