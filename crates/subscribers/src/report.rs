//! Per-event handling reports.

use serde::{Deserialize, Serialize};

/// Why one unit of work (an order line, a reservation) was skipped or failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub unit: String,
    pub reason: String,
}

/// What one subscriber did with one event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerReport {
    pub subscriber: String,
    pub succeeded: usize,
    pub skipped: Vec<UnitOutcome>,
    pub failed: Vec<UnitOutcome>,
}

impl HandlerReport {
    pub fn new(subscriber: impl Into<String>) -> Self {
        Self {
            subscriber: subscriber.into(),
            ..Default::default()
        }
    }

    /// A report for a handler that failed before doing any unit of work.
    pub fn failure(subscriber: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut report = Self::new(subscriber);
        report.fail("event", reason);
        report
    }

    pub fn succeed(&mut self) {
        self.succeeded += 1;
    }

    pub fn skip(&mut self, unit: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(UnitOutcome {
            unit: unit.into(),
            reason: reason.into(),
        });
    }

    pub fn fail(&mut self, unit: impl Into<String>, reason: impl Into<String>) {
        self.failed.push(UnitOutcome {
            unit: unit.into(),
            reason: reason.into(),
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
