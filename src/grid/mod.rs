//! Level grid - ladder state and invariants, no I/O

pub mod level;
pub mod book;

pub use level::{Level, PulseSettings};
pub use book::{GridParams, LevelGrid, LevelId};
