//! Engine orchestration
//!
//! This module provides the public API for Neuromode. It wires the rolling
//! window, baseline store, metrics and suggestion rules into one stateful
//! engine per monitoring session.

use crate::baseline::BaselineStore;
use crate::error::ComputeError;
use crate::metrics::MetricsComputer;
use crate::suggestion::ModeSuggester;
use crate::types::{Baselines, BaselinesUpdate, FeaturesSnapshot, ModeEngineResult};
use crate::window::RollingWindow;
use tracing::trace;

/// Run a JSON array of snapshots through a fresh engine with default settings.
///
/// # Arguments
/// * `snapshots_json` - JSON array of feature snapshots, oldest first
///
/// # Returns
/// One result JSON per snapshot, in input order
///
/// # Example
/// ```ignore
/// let results = snapshots_to_results(snapshots_json)?;
/// ```
pub fn snapshots_to_results(snapshots_json: String) -> Result<Vec<String>, ComputeError> {
    let snapshots: Vec<FeaturesSnapshot> = serde_json::from_str(&snapshots_json)?;

    let mut engine = ModeEngine::new();
    snapshots
        .into_iter()
        .map(|snap| {
            let result = engine.push_snapshot(snap);
            serde_json::to_string(&result).map_err(|e| ComputeError::EncodingError(e.to_string()))
        })
        .collect()
}

/// Stateful engine for one monitoring session.
///
/// Owns the snapshot window and the baseline profile. It keeps no memory of
/// earlier suggestions; repeat suppression is left to the presentation layer.
/// Concurrent sessions each need their own engine.
#[derive(Debug, Clone)]
pub struct ModeEngine {
    baseline_store: BaselineStore,
    window: RollingWindow,
}

impl Default for ModeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeEngine {
    /// Create an engine with default baselines and window size
    pub fn new() -> Self {
        Self {
            baseline_store: BaselineStore::default(),
            window: RollingWindow::default(),
        }
    }

    /// Create an engine with a specific window size
    pub fn with_window(window_size: usize) -> Self {
        Self {
            baseline_store: BaselineStore::default(),
            window: RollingWindow::new(window_size),
        }
    }

    /// Create an engine seeded with a calibrated baseline profile
    pub fn with_baselines(baselines: Baselines) -> Self {
        Self {
            baseline_store: BaselineStore::new(baselines),
            window: RollingWindow::default(),
        }
    }

    /// Current baseline profile
    pub fn baselines(&self) -> Baselines {
        self.baseline_store.get_baselines()
    }

    /// Merge a partial baseline update
    pub fn update_baselines(&mut self, update: &BaselinesUpdate) {
        self.baseline_store.update(update);
    }

    /// Merge a partial baseline update given as JSON
    pub fn update_baselines_json(&mut self, json: &str) -> Result<(), ComputeError> {
        let update: BaselinesUpdate = serde_json::from_str(json)?;
        self.update_baselines(&update);
        Ok(())
    }

    /// Load baseline state from JSON
    pub fn load_baselines(&mut self, json: &str) -> Result<(), ComputeError> {
        self.baseline_store =
            BaselineStore::from_json(json).map_err(|e| ComputeError::ParseError(e.to_string()))?;
        Ok(())
    }

    /// Save baseline state to JSON
    pub fn save_baselines(&self) -> Result<String, ComputeError> {
        self.baseline_store
            .to_json()
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    pub fn window_size(&self) -> usize {
        self.window.window_size()
    }

    /// Number of snapshots currently buffered
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Push a snapshot and compute metrics and suggestion over the window
    pub fn push_snapshot(&mut self, snap: FeaturesSnapshot) -> ModeEngineResult {
        let window_size = self.window.window_size();
        self.push_snapshot_with_window(snap, window_size)
    }

    /// Push a snapshot using a per-call window size.
    ///
    /// The size bounds this call only: older snapshots beyond it are evicted,
    /// and later calls to [`ModeEngine::push_snapshot`] use the configured size.
    pub fn push_snapshot_with_window(
        &mut self,
        snap: FeaturesSnapshot,
        window_size: usize,
    ) -> ModeEngineResult {
        self.window.push_with_limit(snap.clone(), window_size);

        // an empty window (size 0) falls back to the raw snapshot
        let avg = self.window.average().unwrap_or(snap);
        let baselines = self.baselines();

        let summary = MetricsComputer::compute(&avg, &baselines);
        trace!(ts = avg.ts, ?summary, "summary metrics computed");

        let suggestion = ModeSuggester::suggest(&avg, &summary, &baselines);

        ModeEngineResult {
            summary,
            suggestion,
        }
    }

    /// Process one snapshot JSON and return the result JSON
    pub fn process_json(&mut self, snapshot_json: &str) -> Result<String, ComputeError> {
        let snap: FeaturesSnapshot = serde_json::from_str(snapshot_json)?;
        let result = self.push_snapshot(snap);
        serde_json::to_string(&result).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Mode, SideBands, SummaryMetrics};
    use pretty_assertions::assert_eq;

    fn make_snapshot(ts: i64, bands: SideBands, blink_rate: f64, emg_rms: f64) -> FeaturesSnapshot {
        FeaturesSnapshot {
            ts,
            left: bands,
            right: bands,
            blink_rate,
            eye_drift: 0.0,
            emg_rms,
            sqi: 0.9,
        }
    }

    fn calm(ts: i64) -> FeaturesSnapshot {
        make_snapshot(ts, SideBands::new(2.0, 2.2, 0.2, 5.0), 6.0, 0.025)
    }

    fn worked_example_json() -> &'static str {
        r#"{
            "ts": 1700000000000,
            "left": {"alpha": 10, "beta": 30, "theta": 5, "delta": 5, "gamma": 0},
            "right": {"alpha": 10, "beta": 30, "theta": 5, "delta": 5, "gamma": 0},
            "blinkRate": 10,
            "eyeDrift": 0.01,
            "emgRMS": 0.04,
            "sqi": 0.92
        }"#
    }

    #[test]
    fn test_calm_session_has_no_suggestion() {
        let mut engine = ModeEngine::new();

        for ts in 0..10 {
            let result = engine.push_snapshot(calm(ts));
            assert_eq!(result.suggestion, None);
            assert_eq!(
                result.summary,
                SummaryMetrics {
                    focus_score: 67,
                    stress: 59,
                    fatigue: 40,
                    engagement: 33,
                }
            );
        }
        assert_eq!(engine.window_len(), 6);
    }

    #[test]
    fn test_process_json_worked_example() {
        let mut engine = ModeEngine::new();
        let output = engine.process_json(worked_example_json()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["summary"]["focusScore"], 63);
        assert_eq!(value["summary"]["stress"], 70);
        assert_eq!(value["summary"]["fatigue"], 48);
        assert_eq!(value["summary"]["engagement"], 100);
        assert_eq!(value["suggestion"]["mode"], "refresh");
        assert_eq!(value["suggestion"]["confidence"], 0.8);
    }

    #[test]
    fn test_smoothing_damps_eye_drift_spike() {
        let mut engine = ModeEngine::new();
        for ts in 0..5 {
            engine.push_snapshot(calm(ts));
        }

        // one drifting reading: window mean drift is 0.2 / 6 = 0.033
        let mut drifting = calm(5);
        drifting.eye_drift = 0.2;
        let result = engine.push_snapshot(drifting.clone());
        assert_eq!(result.suggestion, None);

        // a fresh engine sees the spike unsmoothed
        let mut fresh = ModeEngine::new();
        let result = fresh.push_snapshot(drifting);
        assert_eq!(result.suggestion.map(|s| s.mode), Some(Mode::Clarity));
    }

    #[test]
    fn test_per_call_window_size() {
        let mut engine = ModeEngine::new();
        for ts in 0..6 {
            engine.push_snapshot(calm(ts));
        }
        assert_eq!(engine.window_len(), 6);

        let result = engine.push_snapshot_with_window(calm(6), 2);
        assert_eq!(result.suggestion, None);
        assert_eq!(engine.window_len(), 2);
        assert_eq!(engine.window_size(), 6);

        // later pushes refill up to the configured size
        for ts in 7..12 {
            engine.push_snapshot(calm(ts));
        }
        assert_eq!(engine.window_len(), 6);
    }

    #[test]
    fn test_unbounded_window_size() {
        let mut engine = ModeEngine::with_window(usize::MAX);
        let result = engine.push_snapshot(calm(0));

        assert_eq!(engine.window_len(), 1);
        assert_eq!(result.summary.focus_score, 67);

        let result = engine.push_snapshot_with_window(calm(1), usize::MAX);
        assert_eq!(engine.window_len(), 2);
        assert_eq!(result.suggestion, None);
    }

    #[test]
    fn test_zero_window_uses_raw_snapshot() {
        let mut engine = ModeEngine::with_window(0);
        let result = engine.push_snapshot(calm(0));

        assert_eq!(engine.window_len(), 0);
        assert_eq!(result.summary.focus_score, 67);
        assert_eq!(result.suggestion, None);
    }

    #[test]
    fn test_update_baselines_changes_outcome() {
        // theta magnitude of 1 against a baseline of 1 reads as distraction
        let snap = make_snapshot(0, SideBands::new(2.0, 2.2, 1.0, 5.0), 6.0, 0.025);

        let mut engine = ModeEngine::new();
        let result = engine.push_snapshot(snap.clone());
        assert_eq!(result.summary.focus_score, 47);
        assert_eq!(result.suggestion.map(|s| s.mode), Some(Mode::Flow));

        // a higher personal theta baseline makes the same reading ordinary
        let mut engine = ModeEngine::new();
        engine.update_baselines_json(r#"{"theta": 5}"#).unwrap();
        assert_eq!(engine.baselines().theta, 5.0);
        assert_eq!(engine.baselines().blink_rate, 12.0);

        let result = engine.push_snapshot(snap);
        assert_eq!(result.summary.focus_score, 67);
        assert_eq!(result.suggestion, None);
    }

    #[test]
    fn test_baseline_persistence_roundtrip() {
        let mut engine = ModeEngine::new();
        engine.update_baselines(&BaselinesUpdate {
            ba: Some(1.8),
            ..Default::default()
        });

        let saved = engine.save_baselines().unwrap();
        let mut restored = ModeEngine::new();
        restored.load_baselines(&saved).unwrap();

        assert_eq!(restored.baselines(), engine.baselines());
    }

    #[test]
    fn test_load_invalid_baselines() {
        let mut engine = ModeEngine::new();
        let result = engine.load_baselines("not json");
        assert!(matches!(result, Err(ComputeError::ParseError(_))));
    }

    #[test]
    fn test_snapshots_to_results() {
        let input = format!("[{}, {}]", worked_example_json(), worked_example_json());
        let results = snapshots_to_results(input).unwrap();

        assert_eq!(results.len(), 2);
        for result in &results {
            let value: serde_json::Value = serde_json::from_str(result).unwrap();
            assert_eq!(value["summary"]["focusScore"], 63);
        }
    }

    #[test]
    fn test_snapshots_to_results_empty_and_invalid() {
        assert!(snapshots_to_results("[]".to_string()).unwrap().is_empty());
        assert!(snapshots_to_results("not valid json".to_string()).is_err());
    }
}
