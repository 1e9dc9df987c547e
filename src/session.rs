//! Session mode history
//!
//! Records the modes a user actually started during a session, together with
//! the metrics shown before the mode and, once finished, after it. The history
//! lives in memory and can be exported as JSON.

use crate::error::ComputeError;
use crate::types::{Mode, SummaryMetrics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Metrics recorded around a mode, keyed the way the dashboard exports them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMetrics {
    pub focus: u8,
    pub stress: u8,
    pub fatigue: u8,
    pub engagement: u8,
}

impl From<SummaryMetrics> for HistoryMetrics {
    fn from(summary: SummaryMetrics) -> Self {
        Self {
            focus: summary.focus_score,
            stress: summary.stress,
            fatigue: summary.fatigue,
            engagement: summary.engagement,
        }
    }
}

/// One started mode with before/after metrics.
///
/// `startedAt` is exported as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeHistoryEntry {
    pub id: String,
    pub mode: Mode,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    pub before_summary: HistoryMetrics,
    /// Set when the mode is finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_summary: Option<HistoryMetrics>,
}

impl ModeHistoryEntry {
    pub fn is_finished(&self) -> bool {
        self.after_summary.is_some()
    }

    /// Per-metric change (after - before), once finished
    pub fn deltas(&self) -> Option<MetricDeltas> {
        let after = self.after_summary?;
        let before = self.before_summary;

        Some(MetricDeltas {
            focus: i16::from(after.focus) - i16::from(before.focus),
            stress: i16::from(after.stress) - i16::from(before.stress),
            fatigue: i16::from(after.fatigue) - i16::from(before.fatigue),
            engagement: i16::from(after.engagement) - i16::from(before.engagement),
        })
    }
}

/// Signed change of each metric across a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDeltas {
    pub focus: i16,
    pub stress: i16,
    pub fatigue: i16,
    pub engagement: i16,
}

/// In-memory history of started modes, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionHistory {
    entries: Vec<ModeHistoryEntry>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a started mode and return its entry id
    pub fn start_mode(
        &mut self,
        mode: Mode,
        before: SummaryMetrics,
        started_at: DateTime<Utc>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        debug!(%id, %mode, "mode started");

        self.entries.push(ModeHistoryEntry {
            id: id.clone(),
            mode,
            started_at,
            before_summary: before.into(),
            after_summary: None,
        });
        id
    }

    /// Attach the post-mode metrics to a started entry
    pub fn finish_mode(&mut self, id: &str, after: SummaryMetrics) -> Result<(), ComputeError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ComputeError::UnknownHistoryEntry(id.to_string()))?;

        entry.after_summary = Some(after.into());
        debug!(%id, mode = %entry.mode, "mode finished");
        Ok(())
    }

    pub fn entries(&self) -> &[ModeHistoryEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&ModeHistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export the history as a pretty-printed JSON array
    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(&self.entries)
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}
