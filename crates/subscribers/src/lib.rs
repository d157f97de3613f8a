//! Lifecycle event subscribers.
//!
//! The order lifecycle and the product catalog are external producers.
//! This crate binds their events to inventory operations:
//! - Order placed: reserve each variant-linked line at the default location
//! - Order canceled: release the order's reservations
//! - Order fulfilled: confirm the order's reservations
//! - Variant updated: create or refresh the variant's inventory item

pub mod dispatcher;
pub mod error;
pub mod events;
pub mod order;
pub mod report;
pub mod subscriber;
pub mod variant;

pub use dispatcher::EventDispatcher;
pub use error::{Result, SubscriberError};
pub use events::{CatalogVariant, LifecycleEvent, LineItem, PlacedOrder};
pub use order::OrderSubscriber;
pub use report::{HandlerReport, UnitOutcome};
pub use subscriber::Subscriber;
pub use variant::{DEFAULT_VARIANT_STOCK, VariantSubscriber};
