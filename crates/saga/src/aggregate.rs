//! Saga instance derived from the journal.

use common::SagaId;
use serde::{Deserialize, Serialize};

use crate::events::{Compensation, SagaEvent};
use crate::state::SagaState;

/// A completed step and the compensation that undoes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedStep {
    pub name: String,
    pub compensation: Option<Compensation>,
    pub compensated: bool,
}

/// The state of a transaction, rebuilt by applying its journal events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SagaInstance {
    id: Option<SagaId>,
    saga_type: String,
    state: SagaState,
    completed_steps: Vec<CompletedStep>,
    failed_steps: Vec<String>,
    failure_reason: Option<String>,
}

impl SagaInstance {
    /// Rebuilds an instance from a journal.
    pub fn from_events(events: impl IntoIterator<Item = SagaEvent>) -> Self {
        let mut instance = Self::default();
        for event in events {
            instance.apply(event);
        }
        instance
    }

    pub fn apply(&mut self, event: SagaEvent) {
        match event {
            SagaEvent::SagaStarted(data) => {
                self.id = Some(data.saga_id);
                self.saga_type = data.saga_type;
                self.state = SagaState::Running;
            }
            SagaEvent::StepCompleted(data) => {
                self.completed_steps.push(CompletedStep {
                    name: data.step_name,
                    compensation: data.compensation,
                    compensated: false,
                });
            }
            SagaEvent::StepFailed(data) => {
                self.failed_steps.push(data.step_name);
                self.failure_reason = Some(data.error);
            }
            SagaEvent::CompensationStarted(data) => {
                self.state = SagaState::Compensating;
                if self.failure_reason.is_none() {
                    self.failure_reason = Some(data.cause);
                }
            }
            SagaEvent::CompensationStepCompleted(data) => {
                // Compensations run newest first, so mark the latest match.
                if let Some(step) = self
                    .completed_steps
                    .iter_mut()
                    .rev()
                    .find(|s| s.name == data.step_name && s.compensation.is_some() && !s.compensated)
                {
                    step.compensated = true;
                }
            }
            SagaEvent::CompensationStepFailed(data) => {
                self.failure_reason = Some(data.error);
            }
            SagaEvent::SagaCompleted(_) => {
                self.state = SagaState::Completed;
            }
            SagaEvent::SagaCompensated(_) => {
                self.state = SagaState::Compensated;
            }
            SagaEvent::SagaCompensationFailed(data) => {
                self.state = SagaState::CompensationFailed;
                self.failure_reason = Some(data.reason);
            }
        }
    }
}

// Query methods
impl SagaInstance {
    pub fn id(&self) -> Option<SagaId> {
        self.id
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    pub fn saga_type(&self) -> &str {
        &self.saga_type
    }

    pub fn completed_steps(&self) -> &[CompletedStep] {
        &self.completed_steps
    }

    pub fn failed_steps(&self) -> &[String] {
        &self.failed_steps
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Compensations that have not run yet, newest step first.
    pub fn pending_compensations(&self) -> Vec<(String, Compensation)> {
        self.completed_steps
            .iter()
            .rev()
            .filter(|s| !s.compensated)
            .filter_map(|s| s.compensation.clone().map(|c| (s.name.clone(), c)))
            .collect()
    }
}
