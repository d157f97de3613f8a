//! Saga journal events.

use chrono::{DateTime, Utc};
use common::{ItemId, LocationId, ReservationId, SagaId};
use serde::{Deserialize, Serialize};

/// How to undo one completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Compensation {
    /// Re-apply the negated delta an adjustment actually applied.
    ReverseAdjustment {
        inventory_item_id: ItemId,
        location_id: LocationId,
        delta: i64,
        /// Stocked quantity before the adjustment, kept for diagnostics.
        previous_stocked: i64,
        /// The adjustment created the level; drop it again once it is empty.
        #[serde(default)]
        remove_level: bool,
    },

    /// Release a reservation the step created.
    ReleaseReservation { reservation_id: ReservationId },
}

impl Compensation {
    /// Short description used in logs and error reports.
    pub fn describe(&self) -> String {
        match self {
            Compensation::ReverseAdjustment {
                inventory_item_id,
                location_id,
                delta,
                ..
            } => format!("adjust {inventory_item_id}@{location_id} by {delta}"),
            Compensation::ReleaseReservation { reservation_id } => {
                format!("release reservation {reservation_id}")
            }
        }
    }
}

/// Events that can occur during saga execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    /// Transaction started.
    SagaStarted(SagaStartedData),

    /// A step completed and registered its compensation, if any.
    StepCompleted(StepCompletedData),

    /// A step failed without applying anything.
    StepFailed(StepFailedData),

    /// Compensation started.
    CompensationStarted(CompensationData),

    /// A compensation ran successfully.
    CompensationStepCompleted(StepData),

    /// A compensation failed; no further compensations run.
    CompensationStepFailed(StepFailedData),

    /// All steps kept; compensations discarded.
    SagaCompleted(SagaCompletedData),

    /// Every compensation ran.
    SagaCompensated(SagaCompletedData),

    /// Compensation halted on a failure.
    SagaCompensationFailed(SagaFailedData),
}

impl SagaEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::SagaStarted(_) => "SagaStarted",
            SagaEvent::StepCompleted(_) => "StepCompleted",
            SagaEvent::StepFailed(_) => "StepFailed",
            SagaEvent::CompensationStarted(_) => "CompensationStarted",
            SagaEvent::CompensationStepCompleted(_) => "CompensationStepCompleted",
            SagaEvent::CompensationStepFailed(_) => "CompensationStepFailed",
            SagaEvent::SagaCompleted(_) => "SagaCompleted",
            SagaEvent::SagaCompensated(_) => "SagaCompensated",
            SagaEvent::SagaCompensationFailed(_) => "SagaCompensationFailed",
        }
    }
}

/// Data for SagaStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaStartedData {
    pub saga_id: SagaId,
    /// The kind of transaction (e.g., "reserve_inventory").
    pub saga_type: String,
    pub started_at: DateTime<Utc>,
}

/// Data for compensation step events (just the step name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepData {
    pub step_name: String,
}

/// Data for StepCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCompletedData {
    pub step_name: String,
    /// `None` for read-only steps.
    pub compensation: Option<Compensation>,
}

/// Data for StepFailed and CompensationStepFailed events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFailedData {
    pub step_name: String,
    pub error: String,
}

/// Data for CompensationStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationData {
    /// Why the transaction is being unwound.
    pub cause: String,
}

/// Data for SagaCompleted and SagaCompensated events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaCompletedData {
    pub completed_at: DateTime<Utc>,
}

/// Data for SagaCompensationFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaFailedData {
    pub reason: String,
    pub failed_at: DateTime<Utc>,
}

// Convenience constructors
impl SagaEvent {
    pub fn saga_started(saga_id: SagaId, saga_type: impl Into<String>) -> Self {
        SagaEvent::SagaStarted(SagaStartedData {
            saga_id,
            saga_type: saga_type.into(),
            started_at: Utc::now(),
        })
    }

    pub fn step_completed(step_name: impl Into<String>, compensation: Option<Compensation>) -> Self {
        SagaEvent::StepCompleted(StepCompletedData {
            step_name: step_name.into(),
            compensation,
        })
    }

    pub fn step_failed(step_name: impl Into<String>, error: impl Into<String>) -> Self {
        SagaEvent::StepFailed(StepFailedData {
            step_name: step_name.into(),
            error: error.into(),
        })
    }

    pub fn compensation_started(cause: impl Into<String>) -> Self {
        SagaEvent::CompensationStarted(CompensationData {
            cause: cause.into(),
        })
    }

    pub fn compensation_step_completed(step_name: impl Into<String>) -> Self {
        SagaEvent::CompensationStepCompleted(StepData {
            step_name: step_name.into(),
        })
    }

    pub fn compensation_step_failed(
        step_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        SagaEvent::CompensationStepFailed(StepFailedData {
            step_name: step_name.into(),
            error: error.into(),
        })
    }

    pub fn saga_completed() -> Self {
        SagaEvent::SagaCompleted(SagaCompletedData {
            completed_at: Utc::now(),
        })
    }

    pub fn saga_compensated() -> Self {
        SagaEvent::SagaCompensated(SagaCompletedData {
            completed_at: Utc::now(),
        })
    }

    pub fn saga_compensation_failed(reason: impl Into<String>) -> Self {
        SagaEvent::SagaCompensationFailed(SagaFailedData {
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }
}
