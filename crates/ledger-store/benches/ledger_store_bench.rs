use criterion::{Criterion, criterion_group, criterion_main};
use ledger_store::{
    InMemoryLedgerStore, InventoryItem, InventoryLevel, InventoryLocation, ItemId, LedgerStore,
    LocationId, Movement, MovementQuery, ReservationItem, Resolution,
};

async fn seeded(stocked: i64) -> (InMemoryLedgerStore, ItemId, LocationId) {
    let store = InMemoryLedgerStore::new();
    let item = store.insert_item(InventoryItem::new("BENCH")).await.unwrap();
    let location = store
        .insert_location(InventoryLocation::new("Bench", "bench"))
        .await
        .unwrap();
    store
        .insert_level(InventoryLevel::new(item.id, location.id, stocked, 0, 0).unwrap())
        .await
        .unwrap();
    (store, item.id, location.id)
}

fn bench_reserve_and_release(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, item_id, location_id) = rt.block_on(seeded(1_000_000));

    c.bench_function("ledger_store/reserve_and_release", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (reservation, _) = store
                    .create_reservation(ReservationItem::new(item_id, location_id, 1))
                    .await
                    .unwrap();
                store
                    .resolve_reservation(reservation.id, Resolution::Release)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_adjustment(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, item_id, location_id) = rt.block_on(seeded(0));

    c.bench_function("ledger_store/adjustment", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .apply_movement(item_id, location_id, Movement::In(1), false)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_concurrent_reservations(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ledger_store/concurrent_reservations_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                let (store, item_id, location_id) = seeded(50).await;
                let attempts = (0..100).map(|_| {
                    let store = store.clone();
                    tokio::spawn(async move {
                        store
                            .create_reservation(ReservationItem::new(item_id, location_id, 1))
                            .await
                    })
                });
                futures_util::future::join_all(attempts).await;
            });
        });
    });
}

fn bench_list_movements(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, item_id, location_id) = rt.block_on(async {
        let (store, item_id, location_id) = seeded(0).await;
        for _ in 0..1000 {
            store
                .apply_movement(item_id, location_id, Movement::In(1), false)
                .await
                .unwrap();
        }
        (store, item_id, location_id)
    });

    c.bench_function("ledger_store/list_movements_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                store
                    .list_movements(
                        MovementQuery::new()
                            .inventory_item_id(item_id)
                            .location_id(location_id),
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_reserve_and_release,
    bench_adjustment,
    bench_concurrent_reservations,
    bench_list_movements,
);
criterion_main!(benches);
