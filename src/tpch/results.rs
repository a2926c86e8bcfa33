//! Timing capture and the result artifact store
//!
//! Every timed operation produces one metric entry in a named
//! [`TimingRecorder`]; recorders are persisted by the [`ResultStore`] as
//! one JSON file per logical result object under
//! `<root>/<run_id>/<phase>/<Title>.json`. The store is append-only: the
//! aggregator reads everything back as a flat sample list and treats
//! repeated names as repeated measurements.

use crate::tpch::error::{BenchmarkError, BenchmarkResult};
use log::warn;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Artifact phase for the power test
pub const POWER_PHASE: &str = "power";

/// Artifact phase for the throughput test
pub const THROUGHPUT_PHASE: &str = "throughput";

/// Artifact phase for computed composite metrics
pub const METRICS_PHASE: &str = "metrics";

/// Formats a wall-clock duration the way artifacts store it: `HH:MM:SS.ffffff`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60,
        duration.subsec_micros()
    )
}

/// One named result object accumulating metric-name to value entries
///
/// Keys are kept sorted so the persisted JSON is deterministic.
#[derive(Debug, Clone)]
pub struct TimingRecorder {
    title: String,
    start: Option<Instant>,
    metrics: BTreeMap<String, String>,
}

impl TimingRecorder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start: None,
            metrics: BTreeMap::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Start the wall-clock timer
    pub fn start_timer(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Elapsed time since `start_timer`, clearing the timer
    ///
    /// Stopping a timer that was never started yields zero.
    pub fn stop_timer(&mut self) -> Duration {
        match self.start.take() {
            Some(start) => start.elapsed(),
            None => {
                warn!("timer for '{}' stopped without being started", self.title);
                Duration::ZERO
            }
        }
    }

    /// Record one timed operation
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        self.metrics.insert(name.to_string(), format_duration(elapsed));
    }

    /// Record one non-duration metric value
    pub fn set_metric(&mut self, name: &str, value: impl ToString) {
        self.metrics.insert(name.to_string(), value.to_string());
    }

    pub fn metrics(&self) -> &BTreeMap<String, String> {
        &self.metrics
    }
}

/// One (metric name, raw value) pair read back from a persisted artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingSample {
    pub name: String,
    pub value: String,
}

/// Append-only JSON artifact persistence, keyed by run, phase and title
///
/// This is deliberately separate from the benchmark database connection:
/// artifacts are plain files and never time anything.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist one recorder as `<root>/<run_id>/<phase>/<Title>.json`
    pub fn write(
        &self,
        run_id: &str,
        phase: &str,
        recorder: &TimingRecorder,
    ) -> BenchmarkResult<PathBuf> {
        let dir = self.root.join(run_id).join(phase);
        fs::create_dir_all(&dir).map_err(|e| BenchmarkError::Io {
            message: e.to_string(),
            path: dir.display().to_string(),
        })?;
        let path = dir.join(format!("{}.json", recorder.title()));
        let json =
            serde_json::to_string_pretty(recorder.metrics()).map_err(|e| BenchmarkError::Io {
                message: e.to_string(),
                path: path.display().to_string(),
            })?;
        fs::write(&path, json).map_err(|e| BenchmarkError::Io {
            message: e.to_string(),
            path: path.display().to_string(),
        })?;
        Ok(path)
    }

    /// Read every sample persisted for a run's power and throughput phases
    ///
    /// The metrics phase holds derived values and is not an aggregation
    /// input.
    pub fn read_all(&self, run_id: &str) -> BenchmarkResult<Vec<TimingSample>> {
        let mut samples = Vec::new();
        for phase in [POWER_PHASE, THROUGHPUT_PHASE] {
            let dir = self.root.join(run_id).join(phase);
            if !dir.is_dir() {
                continue;
            }
            let mut files: Vec<PathBuf> = fs::read_dir(&dir)
                .map_err(|e| BenchmarkError::Io {
                    message: e.to_string(),
                    path: dir.display().to_string(),
                })?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect();
            files.sort();
            for path in files {
                let raw = fs::read_to_string(&path).map_err(|e| BenchmarkError::Io {
                    message: e.to_string(),
                    path: path.display().to_string(),
                })?;
                let metrics: BTreeMap<String, String> =
                    serde_json::from_str(&raw).map_err(|e| BenchmarkError::Io {
                        message: e.to_string(),
                        path: path.display().to_string(),
                    })?;
                for (name, value) in metrics {
                    samples.push(TimingSample { name, value });
                }
            }
        }
        Ok(samples)
    }
}
