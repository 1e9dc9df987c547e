//! Band aggregation
//!
//! Converts one side's raw band powers into fractions of total power, and
//! combines the left and right sides into bilateral means.

use crate::types::{FeaturesSnapshot, SideBands};
use serde::{Deserialize, Serialize};

/// Guard added to the total so an all-zero reading never divides by zero
pub const TOTAL_EPSILON: f64 = 1e-9;

/// Per-band fraction of one side's total power
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeBands {
    pub alpha_rel: f64,
    pub beta_rel: f64,
    pub theta_rel: f64,
    pub delta_rel: f64,
    pub gamma_rel: f64,
    /// Sum of all five bands plus [`TOTAL_EPSILON`]
    pub total: f64,
}

impl RelativeBands {
    /// Compute relative fractions for one side
    pub fn of(bands: &SideBands) -> Self {
        let total =
            bands.alpha + bands.beta + bands.theta + bands.delta + bands.gamma() + TOTAL_EPSILON;

        Self {
            alpha_rel: bands.alpha / total,
            beta_rel: bands.beta / total,
            theta_rel: bands.theta / total,
            delta_rel: bands.delta / total,
            gamma_rel: bands.gamma() / total,
            total,
        }
    }

    /// Mean of the left and right fractions of a snapshot
    pub fn bilateral(snap: &FeaturesSnapshot) -> Self {
        let left = Self::of(&snap.left);
        let right = Self::of(&snap.right);

        Self {
            alpha_rel: (left.alpha_rel + right.alpha_rel) / 2.0,
            beta_rel: (left.beta_rel + right.beta_rel) / 2.0,
            theta_rel: (left.theta_rel + right.theta_rel) / 2.0,
            delta_rel: (left.delta_rel + right.delta_rel) / 2.0,
            gamma_rel: (left.gamma_rel + right.gamma_rel) / 2.0,
            total: (left.total + right.total) / 2.0,
        }
    }

    /// Sum of the five fractions
    pub fn fraction_sum(&self) -> f64 {
        self.alpha_rel + self.beta_rel + self.theta_rel + self.delta_rel + self.gamma_rel
    }
}

/// Mean of the left and right raw magnitudes for alpha, beta and theta
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanMagnitudes {
    pub alpha: f64,
    pub beta: f64,
    pub theta: f64,
}

impl MeanMagnitudes {
    pub fn of(snap: &FeaturesSnapshot) -> Self {
        Self {
            alpha: (snap.left.alpha + snap.right.alpha) / 2.0,
            beta: (snap.left.beta + snap.right.beta) / 2.0,
            theta: (snap.left.theta + snap.right.theta) / 2.0,
        }
    }
}

/// EEG frequency band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Alpha,
    Beta,
    Theta,
    Delta,
    Gamma,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Theta => "theta",
            Band::Delta => "delta",
            Band::Gamma => "gamma",
        }
    }

    /// Short state description associated with a dominant band
    pub fn insight(&self) -> &'static str {
        match self {
            Band::Alpha => "Relaxed / Calm",
            Band::Beta => "Focus / Thinking",
            Band::Theta => "Meditative / Deep daydream",
            Band::Delta => "Drowsy / Tired",
            Band::Gamma => "Processing / High cognitive load",
        }
    }
}

impl SideBands {
    /// Band with the largest power. Ties resolve to the earliest band in
    /// alpha, beta, theta, delta, gamma order.
    pub fn dominant(&self) -> Band {
        let candidates = [
            (Band::Beta, self.beta),
            (Band::Theta, self.theta),
            (Band::Delta, self.delta),
            (Band::Gamma, self.gamma()),
        ];

        let mut best = (Band::Alpha, self.alpha);
        for (band, power) in candidates {
            if power > best.1 {
                best = (band, power);
            }
        }
        best.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(left: SideBands, right: SideBands) -> FeaturesSnapshot {
        FeaturesSnapshot {
            ts: 0,
            left,
            right,
            blink_rate: 12.0,
            eye_drift: 0.0,
            emg_rms: 0.05,
            sqi: 1.0,
        }
    }

    #[test]
    fn test_relative_fractions() {
        let rel = RelativeBands::of(&SideBands::new(10.0, 30.0, 5.0, 5.0));

        assert!((rel.alpha_rel - 0.2).abs() < 1e-9);
        assert!((rel.beta_rel - 0.6).abs() < 1e-9);
        assert!((rel.theta_rel - 0.1).abs() < 1e-9);
        assert!((rel.delta_rel - 0.1).abs() < 1e-9);
        assert_eq!(rel.gamma_rel, 0.0);
        assert!((rel.total - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_fractions_sum_to_one() {
        let sides = [
            SideBands::new(10.0, 30.0, 5.0, 5.0),
            SideBands::new(0.3, 0.0, 0.0, 0.0),
            SideBands::new(1.0, 2.0, 3.0, 4.0).with_gamma(5.0),
            SideBands::new(1e6, 3e5, 0.5, 2e4).with_gamma(1e3),
        ];

        for side in &sides {
            let rel = RelativeBands::of(side);
            assert!((rel.fraction_sum() - 1.0).abs() < 1e-6, "{side:?}");
        }
    }

    #[test]
    fn test_all_zero_side_is_finite() {
        let rel = RelativeBands::of(&SideBands::default());

        assert_eq!(rel.fraction_sum(), 0.0);
        assert!(rel.alpha_rel.is_finite());
        assert_eq!(rel.total, TOTAL_EPSILON);
    }

    #[test]
    fn test_gamma_counts_toward_total() {
        let without = RelativeBands::of(&SideBands::new(1.0, 1.0, 1.0, 1.0));
        let with = RelativeBands::of(&SideBands::new(1.0, 1.0, 1.0, 1.0).with_gamma(4.0));

        assert!((without.alpha_rel - 0.25).abs() < 1e-9);
        assert!((with.alpha_rel - 0.125).abs() < 1e-9);
        assert!((with.gamma_rel - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bilateral_mean() {
        let snap = snapshot(
            SideBands::new(10.0, 10.0, 0.0, 0.0),
            SideBands::new(30.0, 10.0, 0.0, 0.0),
        );
        let rel = RelativeBands::bilateral(&snap);

        // left alpha 0.5, right alpha 0.75
        assert!((rel.alpha_rel - 0.625).abs() < 1e-9);
        assert!((rel.beta_rel - 0.375).abs() < 1e-9);

        let mags = MeanMagnitudes::of(&snap);
        assert_eq!(mags.alpha, 20.0);
        assert_eq!(mags.beta, 10.0);
        assert_eq!(mags.theta, 0.0);
    }

    #[test]
    fn test_dominant_band() {
        assert_eq!(SideBands::new(10.0, 30.0, 5.0, 5.0).dominant(), Band::Beta);
        assert_eq!(
            SideBands::new(1.0, 1.0, 1.0, 1.0).with_gamma(3.0).dominant(),
            Band::Gamma
        );
        // ties keep the earlier band
        assert_eq!(SideBands::new(2.0, 1.0, 2.0, 0.0).dominant(), Band::Alpha);
        assert_eq!(Band::Delta.insight(), "Drowsy / Tired");
    }
}
