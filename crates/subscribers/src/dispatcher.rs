//! Event dispatcher delivering lifecycle events to subscribers.

use std::sync::Arc;

use inventory::InventoryService;
use ledger_store::LedgerStore;

use crate::Result;
use crate::events::LifecycleEvent;
use crate::order::OrderSubscriber;
use crate::report::HandlerReport;
use crate::subscriber::Subscriber;
use crate::variant::VariantSubscriber;

/// Delivers each event to every subscriber that handles it.
///
/// Subscribers are isolated: one failing never prevents the others from
/// running. Delivery is at-least-once from the producer's side, so
/// redelivery is the retry mechanism and nothing is retried here.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher with the order and variant subscribers bound to
    /// the given service and default location code.
    pub fn for_inventory<S: LedgerStore + 'static>(
        service: Arc<InventoryService<S>>,
        location_code: &str,
    ) -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Arc::new(OrderSubscriber::new(
            Arc::clone(&service),
            location_code,
        )));
        dispatcher.register(Arc::new(VariantSubscriber::new(service, location_code)));
        dispatcher
    }

    pub fn register(&mut self, subscriber: Arc<dyn Subscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers an event and returns one report per interested subscriber.
    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    pub async fn dispatch(&self, event: &LifecycleEvent) -> Vec<HandlerReport> {
        metrics::counter!("subscriber_events_total", "event_type" => event.event_type())
            .increment(1);

        let mut reports = Vec::new();
        for subscriber in self.subscribers.iter().filter(|s| s.handles(event)) {
            let report = match subscriber.handle(event).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!(
                        subscriber = subscriber.name(),
                        error = %e,
                        "subscriber failed"
                    );
                    HandlerReport::failure(subscriber.name(), e.to_string())
                }
            };

            if report.has_failures() {
                metrics::counter!("subscriber_failures_total", "subscriber" => subscriber.name())
                    .increment(report.failed.len() as u64);
            }
            reports.push(report);
        }

        if reports.is_empty() {
            tracing::debug!("no subscriber for event");
        }
        reports
    }

    /// Parses a raw JSON payload and dispatches it.
    pub async fn dispatch_json(&self, payload: serde_json::Value) -> Result<Vec<HandlerReport>> {
        let event: LifecycleEvent = serde_json::from_value(payload)?;
        Ok(self.dispatch(&event).await)
    }
}
