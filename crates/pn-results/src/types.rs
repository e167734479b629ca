//! Manifest types describing a stored run.

use serde::{Deserialize, Serialize};

/// What produced a run directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunKind {
    /// One quasi-static displacement stage.
    QuasiStatic { stage: String },
    /// Rate-controlled unsteady displacement.
    Unsteady,
}

/// Manifest stored alongside the series files of one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub kind: RunKind,
    /// JSON rendering of the case configuration the run used.
    pub config_json: String,
    /// Series file names written for this run (without extension).
    pub series: Vec<String>,
    /// Network summary numbers for quick inspection.
    pub node_count: usize,
    pub throat_count: usize,
    pub porosity: f64,
    pub absolute_permeability: Option<f64>,
}
