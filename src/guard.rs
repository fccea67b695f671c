//! Per-action in-flight tracking so a repeated trigger cannot issue a
//! duplicate remote call while the first one is still pending.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::error::AppError;

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `action`. The claim is released when the returned token drops.
    pub fn begin(&self, action: impl Into<String>) -> Result<InFlightToken, AppError> {
        let action = action.into();
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(action.clone()) {
            warn!(action = %action, "rejecting duplicate request");
            return Err(AppError::Busy(action));
        }
        Ok(InFlightToken {
            action,
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, action: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(action)
    }
}

#[derive(Debug)]
pub struct InFlightToken {
    action: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_is_busy_until_release() {
        let guard = InFlight::new();
        let token = guard.begin("sign-in").unwrap();
        assert!(guard.is_active("sign-in"));
        assert!(matches!(guard.begin("sign-in"), Err(AppError::Busy(a)) if a == "sign-in"));

        drop(token);
        assert!(!guard.is_active("sign-in"));
        assert!(guard.begin("sign-in").is_ok());
    }

    #[test]
    fn distinct_actions_do_not_block_each_other() {
        let guard = InFlight::new();
        let _first = guard.begin("update task 1").unwrap();
        let _second = guard.begin("update task 2").unwrap();
        assert!(guard.is_active("update task 1"));
        assert!(guard.is_active("update task 2"));
    }
}
