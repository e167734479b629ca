//! Progress reporting from simulation stages to observers.
//!
//! Stages publish only after completing an atomic sub-step; observers never
//! see in-flight state. Percent values are monotone within a stage.

use serde::{Deserialize, Serialize};

/// Per-element snapshot for offline replay: (fluid code, concentration).
///
/// Fluid codes: 0 = water, 1 = oil, 2 = transitional.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SnapshotFrame {
    pub step: usize,
    pub fluids: Vec<u8>,
    pub concentrations: Vec<f64>,
}

/// A progress event emitted after a completed sub-step.
#[derive(Clone, Debug)]
pub struct ProgressEvent {
    /// Monotonically increasing percent-complete for the running stage.
    pub percent: u8,
    /// Short human-readable status line.
    pub status: String,
}

/// Sink for progress events and optional snapshot frames.
///
/// Implementations must be cheap: stages call these from their worker
/// thread between sub-steps.
pub trait ProgressSink {
    fn on_progress(&mut self, event: ProgressEvent);

    /// Per-element frame for replay; only called when snapshots are enabled.
    fn on_snapshot(&mut self, _frame: SnapshotFrame) {}
}

/// Discards everything; the default sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&mut self, _event: ProgressEvent) {}
}

/// Collects events in memory; useful in tests and the CLI.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub events: Vec<ProgressEvent>,
    pub frames: Vec<SnapshotFrame>,
}

impl ProgressSink for MemorySink {
    fn on_progress(&mut self, event: ProgressEvent) {
        self.events.push(event);
    }

    fn on_snapshot(&mut self, frame: SnapshotFrame) {
        self.frames.push(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_collects_in_order() {
        let mut sink = MemorySink::default();
        for pct in [0_u8, 40, 100] {
            sink.on_progress(ProgressEvent {
                percent: pct,
                status: format!("step {pct}"),
            });
        }
        let got: Vec<u8> = sink.events.iter().map(|e| e.percent).collect();
        assert_eq!(got, vec![0, 40, 100]);
    }
}
