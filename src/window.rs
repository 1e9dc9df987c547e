//! Rolling snapshot window
//!
//! Keeps the most recent snapshots of a session and averages them into a
//! single smoothed snapshot used by every downstream computation.

use crate::types::{FeaturesSnapshot, SideBands};
use std::collections::VecDeque;
use tracing::debug;

/// Default number of snapshots kept in the window
pub const DEFAULT_WINDOW_SIZE: usize = 6;

/// FIFO buffer of recent snapshots
#[derive(Debug, Clone)]
pub struct RollingWindow {
    snapshots: VecDeque<FeaturesSnapshot>,
    window_size: usize,
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl RollingWindow {
    /// Create an empty window holding at most `window_size` snapshots
    pub fn new(window_size: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(window_size.min(DEFAULT_WINDOW_SIZE)),
            window_size,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Buffered snapshots, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &FeaturesSnapshot> {
        self.snapshots.iter()
    }

    /// Append a snapshot, then drop the oldest entries beyond the window size
    pub fn push(&mut self, snap: FeaturesSnapshot) {
        self.push_with_limit(snap, self.window_size);
    }

    /// Append a snapshot and trim to `limit` for this push only.
    ///
    /// Evicted snapshots are gone, but the configured window size is unchanged.
    pub fn push_with_limit(&mut self, snap: FeaturesSnapshot, limit: usize) {
        self.snapshots.push_back(snap);
        self.evict_to(limit);
    }

    fn evict_to(&mut self, limit: usize) {
        let mut evicted = 0;
        while self.snapshots.len() > limit {
            self.snapshots.pop_front();
            evicted += 1;
        }
        if evicted > 0 {
            debug!(evicted, window_size = limit, "rolling window evicted snapshots");
        }
    }

    /// Elementwise mean of all buffered snapshots.
    ///
    /// The timestamp is taken from the most recent snapshot. Returns `None`
    /// when the window is empty.
    pub fn average(&self) -> Option<FeaturesSnapshot> {
        let latest = self.snapshots.back()?;
        let n = self.snapshots.len() as f64;

        let mut left = BandSums::default();
        let mut right = BandSums::default();
        let mut blink_rate = 0.0;
        let mut eye_drift = 0.0;
        let mut emg_rms = 0.0;
        let mut sqi = 0.0;

        for snap in &self.snapshots {
            left.add(&snap.left);
            right.add(&snap.right);
            blink_rate += snap.blink_rate;
            eye_drift += snap.eye_drift;
            emg_rms += snap.emg_rms;
            sqi += snap.sqi;
        }

        Some(FeaturesSnapshot {
            ts: latest.ts,
            left: left.mean(n),
            right: right.mean(n),
            blink_rate: blink_rate / n,
            eye_drift: eye_drift / n,
            emg_rms: emg_rms / n,
            sqi: sqi / n,
        })
    }
}

#[derive(Default)]
struct BandSums {
    alpha: f64,
    beta: f64,
    theta: f64,
    delta: f64,
    gamma: f64,
}

impl BandSums {
    fn add(&mut self, bands: &SideBands) {
        self.alpha += bands.alpha;
        self.beta += bands.beta;
        self.theta += bands.theta;
        self.delta += bands.delta;
        self.gamma += bands.gamma();
    }

    fn mean(&self, n: f64) -> SideBands {
        SideBands {
            alpha: self.alpha / n,
            beta: self.beta / n,
            theta: self.theta / n,
            delta: self.delta / n,
            gamma: Some(self.gamma / n),
        }
    }
}
