//! Run storage API.

use crate::error::{ResultsError, ResultsResult};
use crate::series::Series;
use crate::types::RunManifest;
use pn_core::SnapshotFrame;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk store: one directory per run, holding `manifest.json`, one
/// delimited `.tsv` per series, and optional `frames.jsonl`.
#[derive(Clone)]
pub struct RunStore {
    root_dir: PathBuf,
}

impl RunStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    pub fn save_run(
        &self,
        manifest: &RunManifest,
        series: &[&Series],
        frames: &[SnapshotFrame],
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join("manifest.json"), manifest_json)?;

        for s in series {
            let mut buf = Vec::new();
            s.write_delimited(&mut buf, '\t')?;
            fs::write(run_dir.join(format!("{}.tsv", s.name())), buf)?;
        }

        if !frames.is_empty() {
            let mut content = String::new();
            for frame in frames {
                content.push_str(&serde_json::to_string(frame)?);
                content.push('\n');
            }
            fs::write(run_dir.join("frames.jsonl"), content)?;
        }

        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let path = self.run_dir(run_id).join("manifest.json");
        if !path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_frames(&self, run_id: &str) -> ResultsResult<Vec<SnapshotFrame>> {
        let path = self.run_dir(run_id).join("frames.jsonl");
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        let mut frames = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            frames.push(serde_json::from_str(line)?);
        }
        Ok(frames)
    }

    /// Run ids present in the store, unordered.
    pub fn list_runs(&self) -> ResultsResult<Vec<String>> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().join("manifest.json").exists()
                && let Some(name) = entry.file_name().to_str()
            {
                runs.push(name.to_string());
            }
        }
        Ok(runs)
    }
}
