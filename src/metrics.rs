//! Summary metrics
//!
//! This module maps one averaged snapshot plus the baseline profile to the
//! four gauge scores:
//! - Focus (beta/alpha ratio against theta, blink and muscle noise)
//! - Stress (relative beta, muscle noise, blink rate)
//! - Fatigue (relative theta and delta against relative alpha)
//! - Engagement (beta against alpha plus theta, baseline-free)
//!
//! Every normalized term is clamped to [0, 1] before weighting, so each score
//! stays in 0..=100 whatever the input magnitudes.

use crate::bands::{MeanMagnitudes, RelativeBands};
use crate::types::{Baselines, FeaturesSnapshot, SummaryMetrics};
use serde::{Deserialize, Serialize};

/// Guard added to normalization denominators
const NORM_EPSILON: f64 = 1e-6;

/// Fixed delta reference used by fatigue; delta has no personal baseline yet
pub const DELTA_REL_REFERENCE: f64 = 0.15;

/// Ratio range mapped onto the engagement scale
const ENGAGEMENT_RATIO_MIN: f64 = 0.5;
const ENGAGEMENT_RATIO_MAX: f64 = 2.0;

/// Metrics computer for averaged snapshots
pub struct MetricsComputer;

impl MetricsComputer {
    /// Compute all four metrics for an averaged snapshot
    pub fn compute(snap: &FeaturesSnapshot, baselines: &Baselines) -> SummaryMetrics {
        SummaryMetrics {
            focus_score: focus_score(snap, baselines),
            stress: stress(snap, baselines),
            fatigue: fatigue(snap, baselines),
            engagement: engagement(snap),
        }
    }
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Scale a 0..1 index to an integer score
fn to_score(x: f64) -> u8 {
    (100.0 * clamp01(x)).round() as u8
}

/// `value / reference`, with the reference epsilon-guarded
pub(crate) fn ratio_to(value: f64, reference: f64) -> f64 {
    value / (reference + NORM_EPSILON)
}

/// Blink rate against baseline, halved and clamped
fn blink_term(snap: &FeaturesSnapshot, baselines: &Baselines) -> f64 {
    clamp01(ratio_to(snap.blink_rate, baselines.blink_rate) / 2.0)
}

/// EMG RMS against baseline, halved and clamped
fn emg_term(snap: &FeaturesSnapshot, baselines: &Baselines) -> f64 {
    clamp01(ratio_to(snap.emg_rms, baselines.emg_rms) / 2.0)
}

/// Focus score (0-100). Twice the baseline beta/alpha ratio saturates its term.
pub fn focus_score(snap: &FeaturesSnapshot, baselines: &Baselines) -> u8 {
    let mags = MeanMagnitudes::of(snap);

    let ba = mags.beta / (mags.alpha + NORM_EPSILON);
    let ba_norm = clamp01((ba / baselines.ba) / 2.0);
    let theta_norm = clamp01(ratio_to(mags.theta, baselines.theta));
    let blink_norm = blink_term(snap, baselines);
    let emg_norm = emg_term(snap, baselines);

    let score = 0.45 * ba_norm
        + 0.25 * (1.0 - theta_norm)
        + 0.20 * (1.0 - blink_norm)
        + 0.10 * (1.0 - emg_norm);

    to_score(score)
}

/// Stress score (0-100)
pub fn stress(snap: &FeaturesSnapshot, baselines: &Baselines) -> u8 {
    let rel = RelativeBands::bilateral(snap);

    let beta_rel_norm = clamp01(ratio_to(rel.beta_rel, baselines.beta_rel));
    let emg_norm = emg_term(snap, baselines);
    let blink_norm = blink_term(snap, baselines);

    to_score(0.5 * beta_rel_norm + 0.3 * emg_norm + 0.2 * blink_norm)
}

/// Fatigue score (0-100)
pub fn fatigue(snap: &FeaturesSnapshot, baselines: &Baselines) -> u8 {
    let rel = RelativeBands::bilateral(snap);

    let theta_rel_norm = clamp01(ratio_to(rel.theta_rel, baselines.theta_rel));
    let delta_rel_norm = clamp01(ratio_to(rel.delta_rel, DELTA_REL_REFERENCE));
    let alpha_rel_norm = clamp01(ratio_to(rel.alpha_rel, baselines.alpha_rel));

    to_score(0.6 * (delta_rel_norm + theta_rel_norm) / 2.0 + 0.4 * (1.0 - alpha_rel_norm))
}

/// Engagement score (0-100). Does not consult the baseline.
pub fn engagement(snap: &FeaturesSnapshot) -> u8 {
    let mags = MeanMagnitudes::of(snap);

    let raw = mags.beta / (mags.theta + mags.alpha + NORM_EPSILON);
    let norm = (raw - ENGAGEMENT_RATIO_MIN) / (ENGAGEMENT_RATIO_MAX - ENGAGEMENT_RATIO_MIN);

    to_score(norm)
}

/// Coarse gauge band for a 0-100 score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreLevel {
    Low,
    Moderate,
    High,
}

impl ScoreLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=33 => ScoreLevel::Low,
            34..=66 => ScoreLevel::Moderate,
            _ => ScoreLevel::High,
        }
    }
}
