//! Undoable inventory transactions.

use std::sync::Arc;
use std::time::Instant;

use common::SagaId;
use futures_util::future::join_all;
use inventory::{AdjustInventory, CreateReservation, InventoryError, InventoryService};
use ledger_store::{
    AppliedMovement, InventoryLevel, ItemId, LedgerStore, LocationId, ReservationItem,
};

use crate::aggregate::SagaInstance;
use crate::error::{Result, SagaError};
use crate::events::{Compensation, SagaEvent};
use crate::reservation;
use crate::state::SagaState;

/// Step name: a single stock adjustment.
pub const STEP_ADJUST_INVENTORY: &str = "adjust_inventory";

/// Step name: one member of a bulk adjustment.
pub const STEP_BULK_ADJUST: &str = "bulk_adjust";

/// Outcome of [`InventoryTransaction::bulk_adjust`].
#[derive(Debug, Default)]
pub struct BulkAdjustment {
    /// Levels written by the members that succeeded, in input order.
    pub applied: Vec<InventoryLevel>,
    /// Members that failed and applied nothing.
    pub failures: Vec<(AdjustInventory, InventoryError)>,
}

impl BulkAdjustment {
    /// Returns true when every member was applied.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Wraps inventory service calls that must be undoable if a later step of
/// a larger business transaction fails.
///
/// Each completed step registers its compensation in the journal.
/// [`complete`](Self::complete) discards them; [`compensate`](Self::compensate)
/// runs them newest first.
pub struct InventoryTransaction<S: LedgerStore> {
    service: Arc<InventoryService<S>>,
    id: SagaId,
    instance: SagaInstance,
    journal: Vec<SagaEvent>,
    started: Instant,
}

impl<S: LedgerStore> InventoryTransaction<S> {
    pub fn new(service: Arc<InventoryService<S>>, saga_type: &str) -> Self {
        metrics::counter!("saga_executions_total").increment(1);

        let id = SagaId::new();
        let mut transaction = Self {
            service,
            id,
            instance: SagaInstance::default(),
            journal: Vec::new(),
            started: Instant::now(),
        };
        transaction.record(SagaEvent::saga_started(id, saga_type));
        tracing::debug!(saga_id = %id, saga_type, "saga started");
        transaction
    }

    pub fn id(&self) -> SagaId {
        self.id
    }

    pub fn state(&self) -> SagaState {
        self.instance.state()
    }

    pub fn instance(&self) -> &SagaInstance {
        &self.instance
    }

    /// The journal, oldest event first.
    pub fn events(&self) -> &[SagaEvent] {
        &self.journal
    }

    fn record(&mut self, event: SagaEvent) {
        self.instance.apply(event.clone());
        self.journal.push(event);
    }

    fn ensure_running(&self) -> Result<()> {
        let state = self.state();
        if state.can_run() {
            Ok(())
        } else {
            Err(SagaError::InvalidState {
                expected: SagaState::Running.to_string(),
                actual: state,
            })
        }
    }

    fn record_duration(&self) -> f64 {
        let duration = self.started.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds").record(duration);
        duration
    }
}

// Steps
impl<S: LedgerStore> InventoryTransaction<S> {
    /// Adjusts stocked quantity and registers the reverse of the delta
    /// actually applied.
    #[tracing::instrument(skip(self), fields(saga_id = %self.id))]
    pub async fn adjust_inventory(
        &mut self,
        item_id: ItemId,
        location_id: LocationId,
        delta: i64,
    ) -> Result<InventoryLevel> {
        self.ensure_running()?;

        let adjustment = AdjustInventory::new(item_id, location_id, delta);
        match self.service.apply_adjustment(adjustment).await {
            Ok(applied) => {
                self.record(SagaEvent::step_completed(
                    STEP_ADJUST_INVENTORY,
                    reverse_of(&applied),
                ));
                Ok(applied.level)
            }
            Err(e) => {
                self.record(SagaEvent::step_failed(STEP_ADJUST_INVENTORY, e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Runs adjustments concurrently.
    ///
    /// Best-effort: a failing member applies nothing and the others are
    /// kept. Call [`compensate`](Self::compensate) when the report is not
    /// complete and the caller needs all-or-nothing.
    #[tracing::instrument(skip(self, adjustments), fields(saga_id = %self.id, count = adjustments.len()))]
    pub async fn bulk_adjust(&mut self, adjustments: Vec<AdjustInventory>) -> Result<BulkAdjustment> {
        self.ensure_running()?;

        let service = &self.service;
        let outcomes = join_all(adjustments.into_iter().map(|adjustment| async move {
            (adjustment, service.apply_adjustment(adjustment).await)
        }))
        .await;

        let mut report = BulkAdjustment::default();
        for (adjustment, outcome) in outcomes {
            match outcome {
                Ok(applied) => {
                    self.record(SagaEvent::step_completed(
                        STEP_BULK_ADJUST,
                        reverse_of(&applied),
                    ));
                    report.applied.push(applied.level);
                }
                Err(e) => {
                    tracing::warn!(
                        item_id = %adjustment.inventory_item_id,
                        location_id = %adjustment.location_id,
                        delta = adjustment.delta,
                        error = %e,
                        "bulk adjustment member failed"
                    );
                    self.record(SagaEvent::step_failed(STEP_BULK_ADJUST, e.to_string()));
                    report.failures.push((adjustment, e));
                }
            }
        }
        Ok(report)
    }

    /// Places a hold after a read-only availability check.
    ///
    /// Only the reservation step registers a compensation.
    #[tracing::instrument(
        skip(self, input),
        fields(
            saga_id = %self.id,
            item_id = %input.inventory_item_id,
            location_id = %input.location_id,
            quantity = input.quantity
        )
    )]
    pub async fn reserve(&mut self, input: CreateReservation) -> Result<ReservationItem> {
        self.ensure_running()?;

        let item_id = input.inventory_item_id;
        let location_id = input.location_id;
        let requested = input.quantity;

        if let Err(e) = self.check_available(item_id, location_id, requested).await {
            self.record(SagaEvent::step_failed(
                reservation::STEP_CONFIRM_INVENTORY,
                e.to_string(),
            ));
            return Err(e.into());
        }
        self.record(SagaEvent::step_completed(
            reservation::STEP_CONFIRM_INVENTORY,
            None,
        ));

        match self.service.create_reservation(input).await {
            Ok(reservation) => {
                self.record(SagaEvent::step_completed(
                    reservation::STEP_CREATE_RESERVATION,
                    Some(Compensation::ReleaseReservation {
                        reservation_id: reservation.id,
                    }),
                ));
                Ok(reservation)
            }
            Err(e) => {
                self.record(SagaEvent::step_failed(
                    reservation::STEP_CREATE_RESERVATION,
                    e.to_string(),
                ));
                Err(e.into())
            }
        }
    }

    async fn check_available(
        &self,
        item_id: ItemId,
        location_id: LocationId,
        requested: i64,
    ) -> std::result::Result<(), InventoryError> {
        let locations = [location_id];
        if self
            .service
            .confirm_inventory(item_id, &locations, requested)
            .await?
        {
            return Ok(());
        }

        let available = self
            .service
            .get_available_quantity(item_id, Some(&locations[..]))
            .await?;
        Err(InventoryError::InsufficientInventory {
            item_id,
            location_id,
            available,
            requested,
        })
    }
}

// Lifecycle
impl<S: LedgerStore> InventoryTransaction<S> {
    /// Keeps every step and discards the compensations.
    #[tracing::instrument(skip(self), fields(saga_id = %self.id))]
    pub fn complete(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.record(SagaEvent::saga_completed());

        let duration = self.record_duration();
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(saga_id = %self.id, duration, "saga completed");
        Ok(())
    }

    /// Records a failed downstream step, then compensates.
    pub async fn abort(&mut self, step: &str, reason: &str) -> Result<()> {
        self.ensure_running()?;
        self.record(SagaEvent::step_failed(step, reason));
        self.compensate(format!("{step}: {reason}")).await
    }

    /// Runs registered compensations newest first.
    ///
    /// The first failing compensation halts recovery: the transaction ends
    /// in [`SagaState::CompensationFailed`] and the remaining compensations
    /// are reported as pending.
    #[tracing::instrument(skip(self, cause), fields(saga_id = %self.id))]
    pub async fn compensate(&mut self, cause: impl Into<String>) -> Result<()> {
        let state = self.state();
        if !state.can_compensate() {
            return Err(SagaError::InvalidState {
                expected: SagaState::Running.to_string(),
                actual: state,
            });
        }

        let cause = cause.into();
        tracing::warn!(saga_id = %self.id, %cause, "saga compensating");
        self.record(SagaEvent::compensation_started(cause));

        let pending = self.instance.pending_compensations();
        for (index, (step, compensation)) in pending.iter().enumerate() {
            match self.run_compensation(compensation).await {
                Ok(()) => {
                    self.record(SagaEvent::compensation_step_completed(step.as_str()));
                }
                Err(e) => {
                    let reason = e.to_string();
                    let remaining: Vec<String> = pending[index + 1..]
                        .iter()
                        .map(|(name, c)| format!("{name}: {}", c.describe()))
                        .collect();

                    self.record(SagaEvent::compensation_step_failed(step.as_str(), &reason));
                    self.record(SagaEvent::saga_compensation_failed(format!(
                        "{step}: {reason}"
                    )));

                    self.record_duration();
                    metrics::counter!("saga_compensation_failed").increment(1);
                    tracing::error!(
                        saga_id = %self.id,
                        step = %step,
                        compensation = %compensation.describe(),
                        error = %reason,
                        pending = ?remaining,
                        "compensation failed, manual intervention required"
                    );

                    return Err(SagaError::CompensationFailed {
                        step: step.clone(),
                        reason,
                        pending: remaining,
                    });
                }
            }
        }

        self.record(SagaEvent::saga_compensated());
        let duration = self.record_duration();
        metrics::counter!("saga_compensated").increment(1);
        tracing::info!(saga_id = %self.id, duration, "saga compensated");
        Ok(())
    }

    async fn run_compensation(&self, compensation: &Compensation) -> inventory::Result<()> {
        match *compensation {
            Compensation::ReverseAdjustment {
                inventory_item_id,
                location_id,
                delta,
                remove_level,
                ..
            } => {
                let reversed = self
                    .service
                    .apply_adjustment(AdjustInventory::new(inventory_item_id, location_id, delta))
                    .await?;
                if reversed.entry.quantity != delta {
                    tracing::warn!(
                        item_id = %inventory_item_id,
                        location_id = %location_id,
                        requested = delta,
                        applied = reversed.entry.quantity,
                        "reverse adjustment clamped by reservations"
                    );
                }
                if remove_level && is_empty(&reversed.level) {
                    if let Err(e) = self
                        .service
                        .delete_level(inventory_item_id, location_id)
                        .await
                    {
                        tracing::warn!(
                            item_id = %inventory_item_id,
                            location_id = %location_id,
                            error = %e,
                            "created level kept"
                        );
                    }
                }
            }
            Compensation::ReleaseReservation { reservation_id } => {
                self.service.delete_reservation(reservation_id).await?;
            }
        }
        Ok(())
    }
}

/// Builds the compensation for an applied adjustment. A no-op movement
/// needs none.
fn reverse_of(applied: &AppliedMovement) -> Option<Compensation> {
    let movement = &applied.entry;
    (movement.quantity != 0).then(|| Compensation::ReverseAdjustment {
        inventory_item_id: movement.inventory_item_id,
        location_id: movement.location_id,
        delta: -movement.quantity,
        previous_stocked: movement.stocked_after - movement.quantity,
        remove_level: applied.created_level,
    })
}

fn is_empty(level: &InventoryLevel) -> bool {
    level.stocked_quantity == 0 && level.reserved_quantity == 0 && level.incoming_quantity == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventory::{CreateInventoryItem, CreateInventoryLevel, CreateLocation};
    use ledger_store::InMemoryLedgerStore;

    type Service = InventoryService<InMemoryLedgerStore>;

    async fn seeded(stocked: i64) -> (Arc<Service>, ItemId, LocationId) {
        let service = InventoryService::new(InMemoryLedgerStore::new());
        let item = service
            .create_item(CreateInventoryItem::new("SKU-1"))
            .await
            .unwrap();
        let location = service
            .create_location(CreateLocation::new("Main", "main"))
            .await
            .unwrap();
        service
            .create_level(CreateInventoryLevel::new(item.id, location.id, stocked))
            .await
            .unwrap();
        (Arc::new(service), item.id, location.id)
    }

    #[tokio::test]
    async fn test_adjustment_compensation_restores_stocked() {
        let (service, item_id, location_id) = seeded(10).await;
        let mut tx = InventoryTransaction::new(Arc::clone(&service), "test");

        let level = tx.adjust_inventory(item_id, location_id, 20).await.unwrap();
        assert_eq!(level.stocked_quantity, 30);

        tx.compensate("downstream failed").await.unwrap();
        assert_eq!(tx.state(), SagaState::Compensated);
        let level = service.retrieve_level(item_id, location_id).await.unwrap();
        assert_eq!(level.stocked_quantity, 10);
    }

    #[tokio::test]
    async fn test_clamped_adjustment_reverses_applied_delta() {
        let (service, item_id, location_id) = seeded(10).await;
        service
            .create_reservation(CreateReservation::new(item_id, location_id, 4))
            .await
            .unwrap();

        let mut tx = InventoryTransaction::new(Arc::clone(&service), "test");
        let level = tx.adjust_inventory(item_id, location_id, -100).await.unwrap();
        assert_eq!(level.stocked_quantity, 4);

        tx.compensate("undo").await.unwrap();
        let level = service.retrieve_level(item_id, location_id).await.unwrap();
        assert_eq!(level.stocked_quantity, 10);
        assert_eq!(level.reserved_quantity, 4);
    }

    #[tokio::test]
    async fn test_complete_discards_compensations() {
        let (service, item_id, location_id) = seeded(10).await;
        let mut tx = InventoryTransaction::new(Arc::clone(&service), "test");
        tx.adjust_inventory(item_id, location_id, 5).await.unwrap();
        tx.complete().unwrap();

        assert_eq!(tx.state(), SagaState::Completed);
        assert!(matches!(
            tx.compensate("too late").await,
            Err(SagaError::InvalidState { .. })
        ));
        assert!(matches!(
            tx.adjust_inventory(item_id, location_id, 1).await,
            Err(SagaError::InvalidState { .. })
        ));
        let level = service.retrieve_level(item_id, location_id).await.unwrap();
        assert_eq!(level.stocked_quantity, 15);
    }

    #[tokio::test]
    async fn test_reserve_insufficient_reports_quantities() {
        let (service, item_id, location_id) = seeded(3).await;
        let mut tx = InventoryTransaction::new(service, reservation::SAGA_TYPE);

        let err = tx
            .reserve(CreateReservation::new(item_id, location_id, 5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SagaError::Inventory(InventoryError::InsufficientInventory {
                available: 3,
                requested: 5,
                ..
            })
        ));
        assert_eq!(
            tx.instance().failed_steps(),
            [reservation::STEP_CONFIRM_INVENTORY.to_string()]
        );
        assert!(tx.instance().pending_compensations().is_empty());
    }

    #[tokio::test]
    async fn test_abort_releases_reservation() {
        let (service, item_id, location_id) = seeded(10).await;
        let mut tx = InventoryTransaction::new(Arc::clone(&service), reservation::SAGA_TYPE);

        tx.reserve(CreateReservation::new(item_id, location_id, 6))
            .await
            .unwrap();
        assert_eq!(
            service
                .get_reserved_quantity(item_id, None)
                .await
                .unwrap(),
            6
        );

        tx.abort("process_payment", "card declined").await.unwrap();
        assert_eq!(tx.state(), SagaState::Compensated);
        assert_eq!(
            tx.instance().failure_reason(),
            Some("card declined")
        );
        let level = service.retrieve_level(item_id, location_id).await.unwrap();
        assert_eq!(level.reserved_quantity, 0);
        assert_eq!(level.available_quantity, 10);
    }

    #[tokio::test]
    async fn test_bulk_adjust_is_best_effort() {
        let (service, item_id, location_id) = seeded(10).await;
        let missing = LocationId::new();
        let mut tx = InventoryTransaction::new(Arc::clone(&service), "bulk");

        let report = tx
            .bulk_adjust(vec![
                AdjustInventory::new(item_id, location_id, 5),
                AdjustInventory::new(item_id, missing, -1),
                AdjustInventory::new(item_id, location_id, 2),
            ])
            .await
            .unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.applied.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0.location_id, missing);
        assert_eq!(
            service.get_stocked_quantity(item_id, None).await.unwrap(),
            17
        );

        tx.compensate("bulk incomplete").await.unwrap();
        assert_eq!(
            service.get_stocked_quantity(item_id, None).await.unwrap(),
            10
        );
    }

    #[tokio::test]
    async fn test_compensation_failure_is_terminal() {
        let (service, item_id, location_id) = seeded(10).await;
        let mut tx = InventoryTransaction::new(Arc::clone(&service), reservation::SAGA_TYPE);
        tx.adjust_inventory(item_id, location_id, 1).await.unwrap();
        let reservation = tx
            .reserve(CreateReservation::new(item_id, location_id, 2))
            .await
            .unwrap();

        // Someone else releases the hold first.
        service.delete_reservation(reservation.id).await.unwrap();

        let err = tx.compensate("downstream failed").await.unwrap_err();
        assert!(err.is_fatal());
        match err {
            SagaError::CompensationFailed { step, pending, .. } => {
                assert_eq!(step, reservation::STEP_CREATE_RESERVATION);
                assert_eq!(pending.len(), 1);
                assert!(pending[0].starts_with(STEP_ADJUST_INVENTORY));
            }
            other => panic!("expected CompensationFailed, got {other:?}"),
        }
        assert_eq!(tx.state(), SagaState::CompensationFailed);
        assert!(!tx.state().is_consistent());
        // The adjustment was never reversed.
        assert_eq!(
            service.get_stocked_quantity(item_id, None).await.unwrap(),
            11
        );
    }

    #[tokio::test]
    async fn test_compensation_removes_level_it_created() {
        let (service, item_id, main) = seeded(10).await;
        let overflow = service
            .create_location(CreateLocation::new("Overflow", "overflow"))
            .await
            .unwrap();

        let mut tx = InventoryTransaction::new(Arc::clone(&service), "test");
        tx.adjust_inventory(item_id, overflow.id, 7).await.unwrap();
        tx.adjust_inventory(item_id, main, 3).await.unwrap();
        assert_eq!(
            service.get_stocked_quantity(item_id, None).await.unwrap(),
            20
        );

        tx.compensate("downstream failed").await.unwrap();
        assert!(matches!(
            service.retrieve_level(item_id, overflow.id).await,
            Err(InventoryError::NotFound { .. })
        ));
        let level = service.retrieve_level(item_id, main).await.unwrap();
        assert_eq!(level.stocked_quantity, 10);
    }

    #[test]
    fn test_reverse_of_zero_movement_is_none() {
        let item_id = ItemId::new();
        let location_id = LocationId::new();
        let applied = AppliedMovement {
            level: InventoryLevel::new(item_id, location_id, 4, 4, 0).unwrap(),
            entry: ledger_store::StockMovement {
                id: ledger_store::MovementId::new(),
                inventory_item_id: item_id,
                location_id,
                kind: ledger_store::MovementKind::Adjustment,
                quantity: 0,
                stocked_after: 4,
                reserved_after: 4,
                reservation_id: None,
                reference: None,
                occurred_at: chrono::Utc::now(),
            },
            created_level: false,
        };
        assert!(reverse_of(&applied).is_none());
    }
}
