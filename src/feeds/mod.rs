//! Fill feeds - sources of trade notifications for the engine

pub mod rest_client;
pub mod simulated;

pub use rest_client::TradePoller;
pub use simulated::RandomWalkFeed;

use crate::core::FillEvent;

pub type FillSender = flume::Sender<FillEvent>;
pub type FillReceiver = flume::Receiver<FillEvent>;

/// Unbounded channel; notifications are delivered in the order sent
pub fn fill_channel() -> (FillSender, FillReceiver) {
    flume::unbounded()
}
