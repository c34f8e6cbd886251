//! # Execution Budget
//!
//! Alcuni host impongono un limite di tempo di esecuzione al processo. Prima
//! di ogni passo potenzialmente lungo (upload, download, re-encode) il budget
//! viene riavviato se mancano meno di 10 secondi al limite configurato.
//! Senza limite (`max_execution_seconds = 0`) è un no-op.

use std::time::{Duration, Instant};
use tracing::debug;

/// Margin kept before the cap is reached
pub const RESET_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ExecutionBudget {
    started: Instant,
    max: Option<Duration>,
}

impl ExecutionBudget {
    pub fn new(max_execution_seconds: u64) -> Self {
        let max = (max_execution_seconds > 0).then(|| Duration::from_secs(max_execution_seconds));
        Self {
            started: Instant::now(),
            max,
        }
    }

    pub fn max(&self) -> Option<Duration> {
        self.max
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Restart the budget when it is about to expire. Returns true on reset.
    pub fn reset_if_required(&mut self) -> bool {
        let Some(max) = self.max else {
            return false;
        };

        let elapsed = self.started.elapsed();
        if elapsed >= max.saturating_sub(RESET_MARGIN) {
            debug!("Execution budget reset after {:?} (cap {:?})", elapsed, max);
            self.started = Instant::now();
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cap_is_noop() {
        let mut budget = ExecutionBudget::new(0);
        assert!(budget.max().is_none());
        assert!(!budget.reset_if_required());
    }

    #[test]
    fn test_far_from_cap_keeps_clock() {
        let mut budget = ExecutionBudget::new(3600);
        assert_eq!(budget.max(), Some(Duration::from_secs(3600)));
        assert!(!budget.reset_if_required());
    }

    #[test]
    fn test_within_margin_resets() {
        // A cap shorter than the margin is always within it
        let mut budget = ExecutionBudget::new(5);
        std::thread::sleep(Duration::from_millis(5));
        assert!(budget.reset_if_required());
        assert!(budget.elapsed() < Duration::from_secs(5));
    }
}
