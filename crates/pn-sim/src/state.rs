//! Stage lifecycle state.

/// Where a stage is in its lifecycle. Single-writer: only the stage's own
/// worker advances this; observers read snapshots through progress events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StageState {
    NotStarted,
    /// Mid-sweep at the given step and imposed capillary pressure.
    Stepping { step: usize, pc: f64 },
    Terminated,
}

/// Why a stage stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// The sweep (or injection target) ran to its natural end.
    Completed,
    /// A cooperative cancellation request was honored at a step boundary.
    Cancelled,
    /// The saturation target was reached before the sweep ended.
    TargetReached,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepping_carries_position() {
        let s = StageState::Stepping { step: 3, pc: 1500.0 };
        assert_ne!(s, StageState::NotStarted);
        assert_ne!(s, StageState::Terminated);
    }
}
