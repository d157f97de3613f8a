use criterion::{Criterion, criterion_group, criterion_main};
use inventory::{
    CreateInventoryItem, CreateInventoryLevel, CreateLocation, CreateReservation, InventoryService,
};
use ledger_store::{InMemoryLedgerStore, ItemId, LocationId, VariantId};

type Service = InventoryService<InMemoryLedgerStore>;

async fn seeded(stocked: i64) -> (Service, ItemId, LocationId) {
    let service = InventoryService::new(InMemoryLedgerStore::new());
    let item = service
        .create_item(CreateInventoryItem::new("BENCH"))
        .await
        .unwrap();
    let location = service
        .create_location(CreateLocation::new("Bench", "bench"))
        .await
        .unwrap();
    service
        .create_level(CreateInventoryLevel::new(item.id, location.id, stocked))
        .await
        .unwrap();
    (service, item.id, location.id)
}

fn bench_reserve_confirm(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (service, item_id, location_id) = rt.block_on(seeded(i64::MAX / 2));

    c.bench_function("inventory/reserve_confirm", |b| {
        b.iter(|| {
            rt.block_on(async {
                let reservation = service
                    .create_reservation(CreateReservation::new(item_id, location_id, 1))
                    .await
                    .unwrap();
                service.confirm_reservation(reservation.id).await.unwrap();
            });
        });
    });
}

fn bench_available_quantity(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (service, item_id) = rt.block_on(async {
        let (service, item_id, _) = seeded(100).await;
        for n in 0..20 {
            let location = service
                .create_location(CreateLocation::new(format!("L{n}"), format!("l{n}")))
                .await
                .unwrap();
            service
                .create_level(CreateInventoryLevel::new(item_id, location.id, 10))
                .await
                .unwrap();
        }
        (service, item_id)
    });

    c.bench_function("inventory/available_quantity_21_locations", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.get_available_quantity(item_id, None).await.unwrap();
            });
        });
    });
}

fn bench_sync_with_variant(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service: Service = InventoryService::new(InMemoryLedgerStore::new());
    let variant = VariantId::new("variant_bench");

    c.bench_function("inventory/sync_with_variant_repeat", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .sync_with_variant(&variant, "BENCH", 100, None)
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_reserve_confirm,
    bench_available_quantity,
    bench_sync_with_variant,
);
criterion_main!(benches);
