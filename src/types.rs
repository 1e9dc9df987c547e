//! Core types for the Neuromode engine
//!
//! This module defines the data structures that flow through each stage of the
//! engine: raw feature snapshots, the baseline profile, summary metrics and
//! mode suggestions. JSON field names follow the dashboard's camelCase wire format.

use crate::error::ComputeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Band powers for one sensor side (raw, power-like units)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SideBands {
    pub alpha: f64,
    pub beta: f64,
    pub theta: f64,
    pub delta: f64,
    /// Optional gamma band, treated as zero when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
}

impl SideBands {
    pub fn new(alpha: f64, beta: f64, theta: f64, delta: f64) -> Self {
        Self {
            alpha,
            beta,
            theta,
            delta,
            gamma: None,
        }
    }

    /// Builder-style setter for the gamma band
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    /// Gamma power, zero when the band was not reported
    pub fn gamma(&self) -> f64 {
        self.gamma.unwrap_or(0.0)
    }
}

/// One point-in-time feature reading from the acquisition pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturesSnapshot {
    /// Capture time (epoch milliseconds)
    pub ts: i64,
    pub left: SideBands,
    pub right: SideBands,
    /// Blinks per minute
    pub blink_rate: f64,
    /// Signed eye drift magnitude
    pub eye_drift: f64,
    /// Muscle-noise RMS
    #[serde(rename = "emgRMS")]
    pub emg_rms: f64,
    /// Signal quality index (0..1). Carried through, not used by scoring.
    pub sqi: f64,
}

impl FeaturesSnapshot {
    /// Capture time as a UTC timestamp, if `ts` is within chrono's range
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.ts)
    }
}

/// Personal reference profile of "normal" resting readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baselines {
    /// Expected beta/alpha ratio
    #[serde(rename = "BA")]
    pub ba: f64,
    /// Expected theta magnitude
    pub theta: f64,
    pub beta_rel: f64,
    pub theta_rel: f64,
    pub alpha_rel: f64,
    pub blink_rate: f64,
    #[serde(rename = "emgRMS")]
    pub emg_rms: f64,
}

impl Default for Baselines {
    fn default() -> Self {
        Self {
            ba: 1.0,
            theta: 1.0,
            beta_rel: 0.25,
            theta_rel: 0.15,
            alpha_rel: 0.25,
            blink_rate: 12.0,
            emg_rms: 0.05,
        }
    }
}

impl Baselines {
    /// Overwrite the fields present in `update`, keeping every other field.
    ///
    /// Values are not validated; a zero or negative field is the caller's problem
    /// and simply propagates into implausible scores.
    pub fn merge(&mut self, update: &BaselinesUpdate) {
        if let Some(v) = update.ba {
            self.ba = v;
        }
        if let Some(v) = update.theta {
            self.theta = v;
        }
        if let Some(v) = update.beta_rel {
            self.beta_rel = v;
        }
        if let Some(v) = update.theta_rel {
            self.theta_rel = v;
        }
        if let Some(v) = update.alpha_rel {
            self.alpha_rel = v;
        }
        if let Some(v) = update.blink_rate {
            self.blink_rate = v;
        }
        if let Some(v) = update.emg_rms {
            self.emg_rms = v;
        }
    }
}

/// Partial baseline update; absent fields keep their previous value
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaselinesUpdate {
    #[serde(rename = "BA", skip_serializing_if = "Option::is_none")]
    pub ba: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta_rel: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theta_rel: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha_rel: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blink_rate: Option<f64>,
    #[serde(rename = "emgRMS", skip_serializing_if = "Option::is_none")]
    pub emg_rms: Option<f64>,
}

/// The four gauge metrics, each an integer in 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub focus_score: u8,
    pub stress: u8,
    pub fatigue: u8,
    pub engagement: u8,
}

/// Relaxation mode a suggestion can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Clarity,
    Flow,
    Refresh,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Clarity => "clarity",
            Mode::Flow => "flow",
            Mode::Refresh => "refresh",
        }
    }

    /// Card title shown by the dashboard
    pub fn title(&self) -> &'static str {
        match self {
            Mode::Clarity => "Clarity — Guided Breathing",
            Mode::Flow => "Flow — Visualization",
            Mode::Refresh => "Refresh — Muscle Relaxation",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clarity" => Ok(Mode::Clarity),
            "flow" => Ok(Mode::Flow),
            "refresh" => Ok(Mode::Refresh),
            other => Err(ComputeError::ParseError(format!("unknown mode: {other}"))),
        }
    }
}

/// An actionable recommendation produced by one suggestion rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSuggestion {
    pub mode: Mode,
    pub reason: String,
    /// Fixed per rule, in (0, 1]
    pub confidence: f64,
}

/// Output of one processing step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeEngineResult {
    pub summary: SummaryMetrics,
    /// `None` means no rule matched, which is a normal outcome
    pub suggestion: Option<ModeSuggestion>,
}
