//! # arkdata
//!
//! A versioned store for ARK game data (creatures, items, engrams, beacons,
//! colors, icons) with structural diffing, selective reconciliation of
//! candidate datasets, semantic version bumps and bounded undo/redo history.

pub mod cli;
pub mod commands;
pub mod dataset;
pub mod diff;
pub mod error;
pub mod hash;
pub mod history;
pub mod output;
pub mod progress;
pub mod reconcile;
pub mod store;
pub mod version;
pub mod workspace;

pub use dataset::{Category, Dataset, Entry};
pub use diff::{DiffEngine, DiffResult};
pub use error::{ArkdataError, Result};
pub use history::HistoryStore;
pub use reconcile::{ReconciliationSession, Verdict};
pub use store::ArkStore;
pub use workspace::ArkWorkspace;

/// Current format version for arkdata workspace files
pub const FORMAT_VERSION: &str = "1.0.0";
