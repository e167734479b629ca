//! Cooperative cancellation.
//!
//! A stage receives a `CancelToken` at its entry point and polls it at
//! defined safe points (each invasion fixed-point iteration, each time
//! step). Cancellation is advisory: work already committed for the current
//! step always completes before the stage returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag, cheap to clone across threads.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Poll the flag at a safe point.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_clear() {
        let tok = CancelToken::new();
        assert!(!tok.is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let tok = CancelToken::new();
        let other = tok.clone();
        tok.cancel();
        assert!(other.is_cancelled());
        // idempotent
        other.cancel();
        assert!(tok.is_cancelled());
    }
}
