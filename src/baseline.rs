//! Baseline management
//!
//! This module holds the personal reference profile that every score is
//! normalized against. The profile starts from population defaults and is
//! refined through partial updates from a calibration or settings source.

use crate::types::{Baselines, BaselinesUpdate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Baseline store for one monitoring session.
///
/// Serializes as the bare profile object, the same shape the CLI prints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineStore {
    baselines: Baselines,
}

impl BaselineStore {
    /// Create a store seeded with an explicit profile
    pub fn new(baselines: Baselines) -> Self {
        Self { baselines }
    }

    /// Get the current baseline profile
    pub fn get_baselines(&self) -> Baselines {
        self.baselines
    }

    /// Merge a partial update; fields not present keep their prior value
    pub fn update(&mut self, update: &BaselinesUpdate) {
        self.baselines.merge(update);
        debug!(baselines = ?self.baselines, "baselines updated");
    }

    /// Load baseline store from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize baseline store to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_before_calibration() {
        let store = BaselineStore::default();
        assert_eq!(store.get_baselines(), Baselines::default());
    }

    #[test]
    fn test_partial_update_only_touches_given_field() {
        let mut store = BaselineStore::default();
        store.update(&BaselinesUpdate {
            emg_rms: Some(0.1),
            ..Default::default()
        });

        let b = store.get_baselines();
        assert_eq!(b.emg_rms, 0.1);
        assert_eq!(b.ba, 1.0);
        assert_eq!(b.theta, 1.0);
        assert_eq!(b.beta_rel, 0.25);
        assert_eq!(b.theta_rel, 0.15);
        assert_eq!(b.alpha_rel, 0.25);
        assert_eq!(b.blink_rate, 12.0);
    }

    #[test]
    fn test_successive_updates_accumulate() {
        let mut store = BaselineStore::default();
        store.update(&BaselinesUpdate {
            ba: Some(1.5),
            ..Default::default()
        });
        store.update(&BaselinesUpdate {
            blink_rate: Some(16.0),
            ..Default::default()
        });

        let b = store.get_baselines();
        assert_eq!(b.ba, 1.5);
        assert_eq!(b.blink_rate, 16.0);
    }

    #[test]
    fn test_serialization() {
        let mut store = BaselineStore::default();
        store.update(&BaselinesUpdate {
            theta: Some(0.8),
            ..Default::default()
        });

        let json = store.to_json().unwrap();
        assert!(json.contains("\"BA\""));
        assert!(json.contains("\"emgRMS\""));

        let loaded = BaselineStore::from_json(&json).unwrap();
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_json_is_bare_profile() {
        let json = BaselineStore::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("baselines").is_none());
        assert_eq!(value["blinkRate"], 12.0);

        let profile = r#"{"BA": 1.2, "theta": 0.9, "betaRel": 0.3, "thetaRel": 0.2,
            "alphaRel": 0.22, "blinkRate": 14, "emgRMS": 0.06}"#;
        let store = BaselineStore::from_json(profile).unwrap();
        assert_eq!(store.get_baselines().ba, 1.2);
        assert_eq!(store.get_baselines().emg_rms, 0.06);
    }
}
