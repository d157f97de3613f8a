//! Admin HTTP API for the inventory ledger.
//!
//! Provides REST endpoints for items, locations, levels, adjustments and
//! reservations, a webhook for lifecycle events, and observability
//! endpoints with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use inventory::InventoryService;
use ledger_store::LedgerStore;
use metrics_exporter_prometheus::PrometheusHandle;
use subscribers::EventDispatcher;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: LedgerStore> {
    pub service: Arc<InventoryService<S>>,
    pub dispatcher: Arc<EventDispatcher>,
}

impl<S: LedgerStore + 'static> AppState<S> {
    /// Wires the inventory service and the event subscribers over a store.
    pub fn new(store: S, default_location_code: &str) -> Self {
        let service = Arc::new(InventoryService::new(store));
        let dispatcher = EventDispatcher::for_inventory(Arc::clone(&service), default_location_code);
        Self {
            service,
            dispatcher: Arc::new(dispatcher),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: LedgerStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/inventory",
            get(routes::inventory::list::<S>).post(routes::inventory::create::<S>),
        )
        .route(
            "/inventory/levels",
            get(routes::levels::list::<S>)
                .post(routes::levels::create::<S>)
                .patch(routes::levels::update::<S>)
                .delete(routes::levels::delete::<S>),
        )
        .route("/inventory/adjustments", post(routes::levels::adjust::<S>))
        .route("/inventory/movements", get(routes::levels::movements::<S>))
        .route(
            "/inventory/{id}",
            get(routes::inventory::get::<S>)
                .patch(routes::inventory::update::<S>)
                .delete(routes::inventory::delete::<S>),
        )
        .route(
            "/inventory/{id}/available",
            get(routes::inventory::available::<S>),
        )
        .route(
            "/locations",
            get(routes::locations::list::<S>).post(routes::locations::create::<S>),
        )
        .route(
            "/locations/{id}",
            get(routes::locations::get::<S>).patch(routes::locations::update::<S>),
        )
        .route(
            "/reservations",
            get(routes::reservations::list::<S>).post(routes::reservations::create::<S>),
        )
        .route(
            "/reservations/{id}",
            get(routes::reservations::get::<S>).delete(routes::reservations::release::<S>),
        )
        .route(
            "/reservations/{id}/confirm",
            post(routes::reservations::confirm::<S>),
        )
        .route("/events", post(routes::events::ingest::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
