//! Neuromode - On-device biofeedback engine for EEG wellness metrics
//!
//! Neuromode turns periodic biosignal feature snapshots into four 0-100 gauge
//! metrics and an optional relaxation mode suggestion through a deterministic
//! pipeline: rolling window smoothing → band aggregation → metrics → rule chain.
//!
//! ## Modules
//!
//! - **Engine**: stateful per-session façade (`ModeEngine`)
//! - **Metrics / Suggestion**: pure scoring functions and the ordered rule chain
//! - **Session**: in-memory history of started modes for export

pub mod bands;
pub mod baseline;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod session;
pub mod suggestion;
pub mod types;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use engine::{snapshots_to_results, ModeEngine};
pub use error::ComputeError;
pub use session::{HistoryMetrics, ModeHistoryEntry, SessionHistory};
pub use types::{
    Baselines, BaselinesUpdate, FeaturesSnapshot, Mode, ModeEngineResult, ModeSuggestion,
    SideBands, SummaryMetrics,
};

/// Neuromode version
pub const NEUROMODE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "neuromode";
