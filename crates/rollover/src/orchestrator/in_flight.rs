//! Per-step busy guard.
//!
//! A step claims its slot before checking its flag precondition and holds
//! it until the step returns, so a second trigger while a collaborator call
//! is pending is rejected instead of running the step twice.

use crate::domain::Step;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The set of steps currently executing.
#[derive(Debug, Clone, Default)]
pub struct InFlightSteps {
    steps: Arc<Mutex<HashSet<Step>>>,
}

impl InFlightSteps {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `step`. Returns `None` if it is already claimed.
    pub fn try_claim(&self, step: Step) -> Option<InFlightGuard> {
        if self.lock().insert(step) {
            Some(InFlightGuard {
                steps: Arc::clone(&self.steps),
                step,
            })
        } else {
            None
        }
    }

    /// Whether `step` is currently executing.
    pub fn contains(&self, step: Step) -> bool {
        self.lock().contains(&step)
    }

    // The set stays meaningful even if a holder panicked mid-update.
    fn lock(&self) -> MutexGuard<'_, HashSet<Step>> {
        self.steps.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the claimed step on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    steps: Arc<Mutex<HashSet<Step>>>,
    step: Step,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.step);
    }
}
