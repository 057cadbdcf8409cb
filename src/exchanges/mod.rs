//! Venue implementations - Pluggable trader adapters

pub mod paper;
pub mod rest;

pub use paper::{PaperOrder, PaperTrader};
pub use rest::RestTrader;
