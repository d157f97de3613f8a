//! Catalog variant subscriber.

use std::sync::Arc;

use async_trait::async_trait;
use inventory::InventoryService;
use ledger_store::{ItemQuery, ItemUpdate, LedgerStore};

use crate::Result;
use crate::events::{CatalogVariant, LifecycleEvent};
use crate::report::HandlerReport;
use crate::subscriber::Subscriber;

const NAME: &str = "VariantSubscriber";

/// Stocked quantity given to a variant's first level.
pub const DEFAULT_VARIANT_STOCK: i64 = 100;

/// Keeps inventory items in line with catalog variants.
pub struct VariantSubscriber<S: LedgerStore> {
    service: Arc<InventoryService<S>>,
    location_code: String,
}

impl<S: LedgerStore> VariantSubscriber<S> {
    pub fn new(service: Arc<InventoryService<S>>, location_code: impl Into<String>) -> Self {
        Self {
            service,
            location_code: location_code.into(),
        }
    }

    /// Creates the variant's item with a default level, or refreshes the
    /// sku and title of the existing one. Existing quantities are left alone.
    #[tracing::instrument(skip(self, variant), fields(variant_id = %variant.id, sku = %variant.sku))]
    pub async fn on_variant_updated(&self, variant: &CatalogVariant) -> Result<HandlerReport> {
        let mut report = HandlerReport::new(NAME);

        let existing = self
            .service
            .list_items(ItemQuery::new().variant_id(variant.id.clone()).limit(1))
            .await?
            .into_iter()
            .next();

        match existing {
            None => {
                let level = self
                    .service
                    .sync_with_variant(
                        &variant.id,
                        &variant.sku,
                        DEFAULT_VARIANT_STOCK,
                        Some(self.location_code.as_str()),
                    )
                    .await?;
                if variant.title.is_some() {
                    let update = ItemUpdate {
                        title: variant.title.clone(),
                        ..Default::default()
                    };
                    self.service
                        .update_item(level.inventory_item_id, update)
                        .await?;
                }
                tracing::info!(item_id = %level.inventory_item_id, "inventory item created for variant");
            }
            Some(item) => {
                let update = ItemUpdate {
                    sku: (item.sku != variant.sku).then(|| variant.sku.clone()),
                    title: variant
                        .title
                        .clone()
                        .filter(|title| item.title.as_ref() != Some(title)),
                    ..Default::default()
                };
                if update.is_empty() {
                    report.skip(variant.id.to_string(), "item already up to date");
                    return Ok(report);
                }
                self.service.update_item(item.id, update).await?;
                tracing::info!(item_id = %item.id, "inventory item refreshed from variant");
            }
        }

        report.succeed();
        Ok(report)
    }
}

#[async_trait]
impl<S: LedgerStore + 'static> Subscriber for VariantSubscriber<S> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn handles(&self, event: &LifecycleEvent) -> bool {
        matches!(event, LifecycleEvent::VariantUpdated(_))
    }

    async fn handle(&self, event: &LifecycleEvent) -> Result<HandlerReport> {
        match event {
            LifecycleEvent::VariantUpdated(variant) => self.on_variant_updated(variant).await,
            _ => Ok(HandlerReport::new(NAME)),
        }
    }
}
