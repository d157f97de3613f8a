//! Core subscriber trait.

use async_trait::async_trait;

use crate::Result;
use crate::events::LifecycleEvent;
use crate::report::HandlerReport;

/// Reacts to lifecycle events by calling inventory operations.
///
/// A subscriber records per-unit outcomes in its report and returns an
/// error only when the event as a whole could not be handled.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Returns the name of this subscriber.
    fn name(&self) -> &'static str;

    /// Returns true if this subscriber wants the event.
    fn handles(&self, event: &LifecycleEvent) -> bool;

    /// Handles a single event.
    async fn handle(&self, event: &LifecycleEvent) -> Result<HandlerReport>;
}
