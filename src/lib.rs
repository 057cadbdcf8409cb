//! Pulse Grid - Core Library
//! Symmetric grid market maker with jittered re-quoting

// Public modules
pub mod core;
pub mod grid;
pub mod execution;
pub mod exchanges;
pub mod feeds;
pub mod engine;

// Re-exports
pub use core::{Config, Error, Result};
pub use engine::{FillOutcome, GridEngine, PulseReport, ReconcileReport};
pub use execution::OrderExecutor;
pub use grid::{GridParams, LevelGrid};
