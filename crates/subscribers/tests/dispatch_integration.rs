//! End-to-end event flows through the dispatcher.

use std::sync::Arc;

use common::{LineItemId, OrderId, VariantId};
use inventory::InventoryService;
use ledger_store::{InMemoryLedgerStore, ItemQuery, LevelQuery};
use subscribers::{
    CatalogVariant, DEFAULT_VARIANT_STOCK, EventDispatcher, LifecycleEvent, LineItem, PlacedOrder,
};

type Service = InventoryService<InMemoryLedgerStore>;

fn setup() -> (Arc<Service>, Arc<EventDispatcher>) {
    let service = Arc::new(InventoryService::new(InMemoryLedgerStore::new()));
    let dispatcher = EventDispatcher::for_inventory(Arc::clone(&service), "default");
    (service, Arc::new(dispatcher))
}

fn variant_updated(id: &str, sku: &str) -> LifecycleEvent {
    LifecycleEvent::VariantUpdated(CatalogVariant {
        id: VariantId::new(id),
        sku: sku.to_string(),
        title: None,
    })
}

fn order_placed(order: &str, variant: &str, quantity: i64) -> LifecycleEvent {
    LifecycleEvent::OrderPlaced(PlacedOrder::new(OrderId::new(order)).with_item(LineItem::new(
        LineItemId::new(format!("{order}_line")),
        Some(VariantId::new(variant)),
        quantity,
    )))
}

#[tokio::test]
async fn variant_then_order_lifecycle() {
    let (service, dispatcher) = setup();

    dispatcher
        .dispatch(&variant_updated("variant_1", "MUG"))
        .await;
    let item = service
        .list_items(ItemQuery::new().variant_id(VariantId::new("variant_1")))
        .await
        .unwrap()
        .remove(0);

    let reports = dispatcher.dispatch(&order_placed("order_1", "variant_1", 4)).await;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].subscriber, "OrderSubscriber");
    assert_eq!(reports[0].succeeded, 1);

    dispatcher
        .dispatch(&LifecycleEvent::order_fulfilled(OrderId::new("order_1")))
        .await;

    let levels = service.list_levels(LevelQuery::for_item(item.id)).await.unwrap();
    assert_eq!(levels[0].stocked_quantity, DEFAULT_VARIANT_STOCK - 4);
    assert_eq!(levels[0].reserved_quantity, 0);
    assert!(
        service
            .list_reservations_by_external_id(&OrderId::new("order_1"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn redelivered_cancel_is_harmless() {
    let (service, dispatcher) = setup();
    dispatcher.dispatch(&variant_updated("variant_1", "MUG")).await;
    dispatcher.dispatch(&order_placed("order_1", "variant_1", 10)).await;

    let cancel = LifecycleEvent::order_canceled(OrderId::new("order_1"));
    let first = dispatcher.dispatch(&cancel).await;
    let second = dispatcher.dispatch(&cancel).await;
    assert_eq!(first[0].succeeded, 1);
    assert_eq!(second[0].succeeded, 0);
    assert!(!second[0].has_failures());

    let item = service.list_items(ItemQuery::new()).await.unwrap().remove(0);
    assert_eq!(
        service.get_available_quantity(item.id, None).await.unwrap(),
        DEFAULT_VARIANT_STOCK
    );
}

#[tokio::test]
async fn redelivered_order_holds_stock_once() {
    let (service, dispatcher) = setup();
    dispatcher.dispatch(&variant_updated("variant_1", "MUG")).await;

    let placed = order_placed("order_1", "variant_1", 3);
    let first = dispatcher.dispatch(&placed).await;
    let second = dispatcher.dispatch(&placed).await;
    assert_eq!(first[0].succeeded, 1);
    assert_eq!(second[0].succeeded, 0);
    assert_eq!(second[0].skipped.len(), 1);
    assert!(!second[0].has_failures());

    let item = service.list_items(ItemQuery::new()).await.unwrap().remove(0);
    assert_eq!(service.get_reserved_quantity(item.id, None).await.unwrap(), 3);
    assert_eq!(
        service
            .list_reservations_by_external_id(&OrderId::new("order_1"))
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_never_oversell() {
    let (service, dispatcher) = setup();
    dispatcher.dispatch(&variant_updated("variant_1", "MUG")).await;

    // 30 orders of 4 units compete for 100 units.
    let handles: Vec<_> = (0..30)
        .map(|n| {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                dispatcher
                    .dispatch(&order_placed(&format!("order_{n}"), "variant_1", 4))
                    .await
            })
        })
        .collect();

    let mut reserved_orders = 0;
    let mut failed_orders = 0;
    for handle in handles {
        let reports = handle.await.unwrap();
        reserved_orders += reports[0].succeeded;
        failed_orders += reports[0].failed.len();
    }

    assert_eq!(reserved_orders, 25);
    assert_eq!(failed_orders, 5);

    let item = service.list_items(ItemQuery::new()).await.unwrap().remove(0);
    let levels = service.list_levels(LevelQuery::for_item(item.id)).await.unwrap();
    assert_eq!(levels[0].reserved_quantity, 100);
    assert_eq!(levels[0].available_quantity, 0);
}

#[tokio::test]
async fn webhook_payload_round_trip() {
    let (_, dispatcher) = setup();
    let reports = dispatcher
        .dispatch_json(serde_json::json!({
            "type": "VariantUpdated",
            "data": { "id": "variant_7", "sku": "CAP", "title": "Cap" }
        }))
        .await
        .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].subscriber, "VariantSubscriber");
    assert_eq!(reports[0].succeeded, 1);
}
