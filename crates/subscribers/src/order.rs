//! Order lifecycle subscriber.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use inventory::{CreateReservation, InventoryError, InventoryService};
use ledger_store::{InventoryLocation, ItemQuery, LedgerStore, ReservationQuery};
use saga::{SagaError, reserve_inventory};

use crate::Result;
use crate::events::{LifecycleEvent, LineItem, PlacedOrder};
use crate::report::HandlerReport;
use crate::subscriber::Subscriber;

const NAME: &str = "OrderSubscriber";

/// Places, releases and consumes holds as orders move through their
/// lifecycle.
pub struct OrderSubscriber<S: LedgerStore> {
    service: Arc<InventoryService<S>>,
    location_code: String,
}

impl<S: LedgerStore> OrderSubscriber<S> {
    pub fn new(service: Arc<InventoryService<S>>, location_code: impl Into<String>) -> Self {
        Self {
            service,
            location_code: location_code.into(),
        }
    }

    /// Reserves stock for every variant-linked line at the default location.
    ///
    /// Lines are independent: a line that cannot be reserved is skipped or
    /// counted as failed and the remaining lines still run. A line that
    /// already holds a reservation for the order is skipped, so redelivery
    /// only retries the lines that failed.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id, lines = order.items.len()))]
    pub async fn on_order_placed(&self, order: &PlacedOrder) -> Result<HandlerReport> {
        let mut report = HandlerReport::new(NAME);

        let location = match self.service.location_by_code(&self.location_code).await {
            Ok(location) => Some(location),
            Err(InventoryError::NotFound { .. }) => {
                tracing::warn!(code = %self.location_code, "default location missing");
                None
            }
            Err(e) => return Err(e.into()),
        };

        for line in &order.items {
            let Some(location) = location.as_ref() else {
                report.skip(line.id.to_string(), "default location missing");
                continue;
            };
            self.reserve_line(&order.id, line, location, &mut report)
                .await;
        }

        tracing::info!(
            reserved = report.succeeded,
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "order holds placed"
        );
        Ok(report)
    }

    async fn reserve_line(
        &self,
        order_id: &OrderId,
        line: &LineItem,
        location: &InventoryLocation,
        report: &mut HandlerReport,
    ) {
        let unit = line.id.to_string();
        let Some(variant_id) = line.variant_id.clone() else {
            report.skip(unit, "line has no variant");
            return;
        };

        let held = ReservationQuery::for_external_id(order_id.clone())
            .line_item_id(line.id.clone())
            .limit(1);
        match self.service.list_reservations(held).await {
            Ok(existing) if !existing.is_empty() => {
                tracing::debug!(line_item_id = %line.id, "line already reserved");
                report.skip(unit, "line already reserved");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(line_item_id = %line.id, error = %e, "reservation lookup failed");
                report.fail(unit, e.to_string());
                return;
            }
        }

        let item = match self
            .service
            .list_items(ItemQuery::new().variant_id(variant_id.clone()).limit(1))
            .await
        {
            Ok(items) => items.into_iter().next(),
            Err(e) => {
                tracing::error!(line_item_id = %line.id, error = %e, "item lookup failed");
                report.fail(unit, e.to_string());
                return;
            }
        };
        let Some(item) = item else {
            tracing::warn!(line_item_id = %line.id, %variant_id, "no inventory item for variant");
            report.skip(unit, format!("no inventory item for variant {variant_id}"));
            return;
        };

        let mut input = CreateReservation::new(item.id, location.id, line.quantity)
            .with_external_id(order_id.clone())
            .with_line_item(line.id.clone());
        if !line.title.is_empty() {
            input = input.with_description(line.title.clone());
        }

        match reserve_inventory(Arc::clone(&self.service), input).await {
            Ok(reservation) => {
                tracing::debug!(reservation_id = %reservation.id, line_item_id = %line.id, "line reserved");
                report.succeed();
            }
            Err(SagaError::Inventory(InventoryError::NotFound { entity, id })) => {
                tracing::warn!(line_item_id = %line.id, entity, %id, "line skipped");
                report.skip(unit, format!("{entity} not found: {id}"));
            }
            Err(e) => {
                tracing::error!(line_item_id = %line.id, error = %e, "line reservation failed");
                report.fail(unit, e.to_string());
            }
        }
    }

    /// Releases every hold correlated with the order.
    #[tracing::instrument(skip(self))]
    pub async fn on_order_canceled(&self, order_id: &OrderId) -> Result<HandlerReport> {
        let mut report = HandlerReport::new(NAME);
        let reservations = self
            .service
            .list_reservations_by_external_id(order_id)
            .await?;

        for reservation in reservations {
            match self.service.delete_reservation(reservation.id).await {
                Ok(_) => report.succeed(),
                Err(e) => {
                    tracing::error!(reservation_id = %reservation.id, error = %e, "release failed");
                    report.fail(reservation.id.to_string(), e.to_string());
                }
            }
        }
        Ok(report)
    }

    /// Consumes every hold correlated with the order.
    #[tracing::instrument(skip(self))]
    pub async fn on_order_fulfilled(&self, order_id: &OrderId) -> Result<HandlerReport> {
        let mut report = HandlerReport::new(NAME);
        let reservations = self
            .service
            .list_reservations_by_external_id(order_id)
            .await?;

        for reservation in reservations {
            match self.service.confirm_reservation(reservation.id).await {
                Ok(_) => report.succeed(),
                Err(e) => {
                    tracing::error!(reservation_id = %reservation.id, error = %e, "confirm failed");
                    report.fail(reservation.id.to_string(), e.to_string());
                }
            }
        }
        Ok(report)
    }
}

#[async_trait]
impl<S: LedgerStore + 'static> Subscriber for OrderSubscriber<S> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn handles(&self, event: &LifecycleEvent) -> bool {
        matches!(
            event,
            LifecycleEvent::OrderPlaced(_)
                | LifecycleEvent::OrderCanceled { .. }
                | LifecycleEvent::OrderFulfilled { .. }
        )
    }

    async fn handle(&self, event: &LifecycleEvent) -> Result<HandlerReport> {
        match event {
            LifecycleEvent::OrderPlaced(order) => self.on_order_placed(order).await,
            LifecycleEvent::OrderCanceled { order_id } => self.on_order_canceled(order_id).await,
            LifecycleEvent::OrderFulfilled { order_id } => self.on_order_fulfilled(order_id).await,
            LifecycleEvent::VariantUpdated(_) => Ok(HandlerReport::new(NAME)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{LineItemId, VariantId};
    use inventory::{CreateInventoryItem, CreateInventoryLevel, CreateLocation};
    use ledger_store::{InMemoryLedgerStore, ItemId};

    type Service = InventoryService<InMemoryLedgerStore>;

    async fn seeded(stocked: i64) -> (Arc<Service>, ItemId) {
        let service = InventoryService::new(InMemoryLedgerStore::new());
        let item = service
            .create_item(CreateInventoryItem::new("SKU-1").with_variant(VariantId::new("v1")))
            .await
            .unwrap();
        let location = service
            .create_location(CreateLocation::new("Default", "default"))
            .await
            .unwrap();
        service
            .create_level(CreateInventoryLevel::new(item.id, location.id, stocked))
            .await
            .unwrap();
        (Arc::new(service), item.id)
    }

    fn line(id: &str, variant: Option<&str>, quantity: i64) -> LineItem {
        LineItem::new(LineItemId::new(id), variant.map(VariantId::new), quantity)
    }

    #[tokio::test]
    async fn placed_order_reserves_linked_lines() {
        let (service, item_id) = seeded(10).await;
        let subscriber = OrderSubscriber::new(Arc::clone(&service), "default");

        let order = PlacedOrder::new(OrderId::new("order_1"))
            .with_item(line("line_1", Some("v1"), 3))
            .with_item(line("line_2", None, 1))
            .with_item(line("line_3", Some("unknown"), 1));
        let report = subscriber.on_order_placed(&order).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.skipped.len(), 2);
        assert!(!report.has_failures());

        let holds = service
            .list_reservations_by_external_id(&order.id)
            .await
            .unwrap();
        assert_eq!(holds.len(), 1);
        assert_eq!(holds[0].line_item_id, Some(LineItemId::new("line_1")));
        assert_eq!(
            service.get_reserved_quantity(item_id, None).await.unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn missing_default_location_skips_every_line() {
        let (service, _) = seeded(10).await;
        let subscriber = OrderSubscriber::new(service, "warehouse-9");

        let order = PlacedOrder::new(OrderId::new("order_1"))
            .with_item(line("line_1", Some("v1"), 1))
            .with_item(line("line_2", Some("v1"), 1));
        let report = subscriber.on_order_placed(&order).await.unwrap();

        assert_eq!(report.succeeded, 0);
        assert_eq!(report.skipped.len(), 2);
    }

    #[tokio::test]
    async fn insufficient_line_fails_without_blocking_siblings() {
        let (service, item_id) = seeded(5).await;
        let subscriber = OrderSubscriber::new(Arc::clone(&service), "default");

        let order = PlacedOrder::new(OrderId::new("order_1"))
            .with_item(line("line_1", Some("v1"), 50))
            .with_item(line("line_2", Some("v1"), 2));
        let report = subscriber.on_order_placed(&order).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].unit, "line_1");
        assert_eq!(
            service.get_reserved_quantity(item_id, None).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn redelivered_order_reserves_each_line_once() {
        let (service, item_id) = seeded(10).await;
        let subscriber = OrderSubscriber::new(Arc::clone(&service), "default");

        let order = PlacedOrder::new(OrderId::new("order_1"))
            .with_item(line("line_1", Some("v1"), 3))
            .with_item(line("line_2", Some("v1"), 20));
        let first = subscriber.on_order_placed(&order).await.unwrap();
        assert_eq!(first.succeeded, 1);
        assert_eq!(first.failed.len(), 1);

        // Stock arrives, then the order is delivered again.
        service
            .adjust_inventory(item_id, service.location_by_code("default").await.unwrap().id, 20)
            .await
            .unwrap();
        let second = subscriber.on_order_placed(&order).await.unwrap();
        assert_eq!(second.succeeded, 1);
        assert_eq!(second.skipped.len(), 1);
        assert_eq!(second.skipped[0].unit, "line_1");

        let holds = service
            .list_reservations_by_external_id(&order.id)
            .await
            .unwrap();
        assert_eq!(holds.len(), 2);
        assert_eq!(
            service.get_reserved_quantity(item_id, None).await.unwrap(),
            23
        );
    }

    #[tokio::test]
    async fn cancel_and_fulfill_resolve_holds() {
        let (service, item_id) = seeded(10).await;
        let subscriber = OrderSubscriber::new(Arc::clone(&service), "default");

        let canceled = PlacedOrder::new(OrderId::new("order_c")).with_item(line("a", Some("v1"), 2));
        let fulfilled = PlacedOrder::new(OrderId::new("order_f")).with_item(line("b", Some("v1"), 3));
        subscriber.on_order_placed(&canceled).await.unwrap();
        subscriber.on_order_placed(&fulfilled).await.unwrap();

        let report = subscriber.on_order_canceled(&canceled.id).await.unwrap();
        assert_eq!(report.succeeded, 1);
        let report = subscriber.on_order_fulfilled(&fulfilled.id).await.unwrap();
        assert_eq!(report.succeeded, 1);

        let level = service.list_levels(ledger_store::LevelQuery::for_item(item_id)).await.unwrap();
        assert_eq!(level[0].stocked_quantity, 7);
        assert_eq!(level[0].reserved_quantity, 0);
        assert_eq!(level[0].available_quantity, 7);
    }

    #[tokio::test]
    async fn cancel_without_holds_is_a_no_op() {
        let (service, _) = seeded(10).await;
        let subscriber = OrderSubscriber::new(service, "default");
        let report = subscriber
            .on_order_canceled(&OrderId::new("order_none"))
            .await
            .unwrap();
        assert_eq!(report.succeeded, 0);
        assert!(!report.has_failures());
    }
}
