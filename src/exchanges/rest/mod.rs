//! HTTP/JSON venue adapter

pub mod client;
pub mod model;

pub use client::RestTrader;
