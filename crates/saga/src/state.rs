//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of an inventory transaction in its lifecycle.
///
/// State transitions:
/// ```text
/// Running ──┬──► Completed
///           └──► Compensating ──┬──► Compensated
///                               └──► CompensationFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Steps are being executed.
    #[default]
    Running,

    /// Compensations are being run in reverse order.
    Compensating,

    /// All steps succeeded and compensations were discarded (terminal state).
    Completed,

    /// Every compensation succeeded (terminal state).
    Compensated,

    /// A compensation failed; the ledger needs operator attention
    /// (terminal state).
    CompensationFailed,
}

impl SagaState {
    /// Returns true if the transaction accepts new steps.
    pub fn can_run(&self) -> bool {
        matches!(self, SagaState::Running)
    }

    /// Returns true if the transaction can begin compensation.
    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaState::Running)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SagaState::Completed | SagaState::Compensated | SagaState::CompensationFailed
        )
    }

    /// Returns false only when compensation was left unfinished.
    pub fn is_consistent(&self) -> bool {
        !matches!(self, SagaState::CompensationFailed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Running => "Running",
            SagaState::Compensating => "Compensating",
            SagaState::Completed => "Completed",
            SagaState::Compensated => "Compensated",
            SagaState::CompensationFailed => "CompensationFailed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
