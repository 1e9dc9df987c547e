//! Mode suggestion rules
//!
//! A fixed-priority list of rules evaluated against the averaged snapshot and
//! its summary metrics. The first rule whose predicate holds produces the
//! suggestion; when none holds there is no suggestion.
//!
//! Rule order is the tie-break policy: fatigue and tension outrank milder
//! distraction signals, and the transient blink/drift case is checked last.
//! Thresholds, operators and order must not be changed independently.

use crate::bands::RelativeBands;
use crate::metrics::ratio_to;
use crate::types::{Baselines, FeaturesSnapshot, Mode, ModeSuggestion, SummaryMetrics};
use std::fmt;
use tracing::debug;

/// Values the rule predicates read, derived once per evaluation
#[derive(Debug, Clone, Copy)]
pub struct RuleInputs {
    pub focus: u8,
    pub stress: u8,
    /// Bilateral mean relative theta fraction
    pub theta_rel: f64,
    pub alpha_rel: f64,
    pub beta_rel: f64,
    /// EMG RMS over baseline EMG RMS
    pub emg_ratio: f64,
    /// Blink rate over baseline blink rate
    pub blink_ratio: f64,
    pub eye_drift: f64,
    pub baselines: Baselines,
}

impl RuleInputs {
    pub fn derive(avg: &FeaturesSnapshot, summary: &SummaryMetrics, baselines: &Baselines) -> Self {
        let rel = RelativeBands::bilateral(avg);

        Self {
            focus: summary.focus_score,
            stress: summary.stress,
            theta_rel: rel.theta_rel,
            alpha_rel: rel.alpha_rel,
            beta_rel: rel.beta_rel,
            emg_ratio: ratio_to(avg.emg_rms, baselines.emg_rms),
            blink_ratio: ratio_to(avg.blink_rate, baselines.blink_rate),
            eye_drift: avg.eye_drift,
            baselines: *baselines,
        }
    }

    /// Theta threshold shared by the fatigue and distraction rules.
    /// Compares against the theta magnitude baseline, not `thetaRel`.
    fn theta_limit(&self) -> f64 {
        self.baselines.theta * 1.05
    }
}

/// One entry of the ordered rule chain
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub mode: Mode,
    pub reason: &'static str,
    pub confidence: f64,
    applies: fn(&RuleInputs) -> bool,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("confidence", &self.confidence)
            .finish()
    }
}

impl Rule {
    pub fn matches(&self, inputs: &RuleInputs) -> bool {
        (self.applies)(inputs)
    }

    pub fn suggestion(&self) -> ModeSuggestion {
        ModeSuggestion {
            mode: self.mode,
            reason: self.reason.to_string(),
            confidence: self.confidence,
        }
    }
}

fn fatigue_low_focus(i: &RuleInputs) -> bool {
    i.focus < 55 && i.theta_rel > i.theta_limit()
}

fn tension(i: &RuleInputs) -> bool {
    i.emg_ratio > 1.2 || i.stress > 60
}

fn distraction(i: &RuleInputs) -> bool {
    i.focus < 65 && i.theta_rel <= i.theta_limit() && i.emg_ratio <= 1.1
}

fn over_arousal(i: &RuleInputs) -> bool {
    i.beta_rel > i.baselines.beta_rel * 1.4 && i.alpha_rel < i.baselines.alpha_rel * 0.8
}

fn transient_distraction(i: &RuleInputs) -> bool {
    i.blink_ratio > 1.5 || i.eye_drift.abs() > 0.05
}

/// Rules in evaluation order
pub static RULES: [Rule; 5] = [
    Rule {
        name: "fatigue_low_focus",
        mode: Mode::Clarity,
        reason: "Focus low and theta rising — likely fatigue.",
        confidence: 0.82,
        applies: fatigue_low_focus,
    },
    Rule {
        name: "tension",
        mode: Mode::Refresh,
        reason: "High muscle tension / stress indicators.",
        confidence: 0.80,
        applies: tension,
    },
    Rule {
        name: "distraction",
        mode: Mode::Flow,
        reason: "Low focus but not fatigued — likely distraction.",
        confidence: 0.75,
        applies: distraction,
    },
    Rule {
        name: "over_arousal",
        mode: Mode::Clarity,
        reason: "Over-arousal (high beta, low alpha).",
        confidence: 0.78,
        applies: over_arousal,
    },
    Rule {
        name: "transient_distraction",
        mode: Mode::Clarity,
        reason: "Short distraction detected (blink/eye drift spike).",
        confidence: 0.65,
        applies: transient_distraction,
    },
];

/// Rule-chain evaluator
pub struct ModeSuggester;

impl ModeSuggester {
    /// Return the first matching rule, if any
    pub fn first_match(inputs: &RuleInputs) -> Option<&'static Rule> {
        RULES.iter().find(|rule| rule.matches(inputs))
    }

    /// Evaluate the rule chain for an averaged snapshot and its metrics
    pub fn suggest(
        avg: &FeaturesSnapshot,
        summary: &SummaryMetrics,
        baselines: &Baselines,
    ) -> Option<ModeSuggestion> {
        let inputs = RuleInputs::derive(avg, summary, baselines);

        let rule = Self::first_match(&inputs)?;
        debug!(
            rule = rule.name,
            mode = %rule.mode,
            focus = inputs.focus,
            stress = inputs.stress,
            "mode suggestion rule fired"
        );
        Some(rule.suggestion())
    }
}
