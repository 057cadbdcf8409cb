//! Execution layer - Venue call policies for the grid

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::core::{Error, OrderId, Side, Symbol, Trader};

/// Order executor - wraps a trader for one symbol.
///
/// Turns venue errors into the outcomes the engine acts on: failed
/// placements, queries and replaces become "no effect", open checks fail
/// safe to "still open", cancels retry through transport failures until
/// the venue answers.
#[derive(Clone)]
pub struct OrderExecutor {
    trader: Arc<dyn Trader>,
    symbol: Symbol,
    cancel_retry: Duration,
}

impl OrderExecutor {
    pub fn new(trader: Arc<dyn Trader>, symbol: Symbol, cancel_retry: Duration) -> Self {
        Self {
            trader,
            symbol,
            cancel_retry,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn venue(&self) -> &str {
        self.trader.name()
    }

    /// Place a limit order; `None` on any failure
    pub async fn place(&self, price: Decimal, size: Decimal, side: Side) -> Option<OrderId> {
        match self.trader.place_order(&self.symbol, price, size, side).await {
            Ok(order_id) if !order_id.is_empty() => Some(order_id),
            Ok(_) => {
                error!(%price, %size, %side, "venue returned an empty order id");
                None
            }
            Err(e) => {
                error!(%price, %size, %side, "Cannot place limit order: {}", e);
                None
            }
        }
    }

    /// Whether the order is still active; query errors count as open
    pub async fn is_open(&self, order_id: &OrderId) -> bool {
        match self.trader.is_order_open(order_id, &self.symbol).await {
            Ok(open) => open,
            Err(e) => {
                warn!(%order_id, "Cannot query active orders, assuming open: {}", e);
                true
            }
        }
    }

    /// Cancel an order. Returns true once the order is gone.
    ///
    /// Transport failures retry with a fixed delay until the venue answers.
    /// An order the venue no longer knows counts as cancelled; any other
    /// venue rejection is final and returns false.
    pub async fn cancel(&self, order_id: &OrderId) -> bool {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.trader.cancel_order(order_id).await {
                Ok(()) => {
                    debug!(%order_id, attempt, "order cancelled");
                    return true;
                }
                Err(Error::OrderNotFound(_)) => {
                    debug!(%order_id, "cancel: order already gone");
                    return true;
                }
                Err(e) if e.is_transient() => {
                    warn!(%order_id, attempt, "Cannot cancel order, retrying in {:?}: {}", self.cancel_retry, e);
                }
                Err(e) => {
                    error!(%order_id, attempt, "Cancel rejected by venue: {}", e);
                    return false;
                }
            }
            tokio::time::sleep(self.cancel_retry).await;
        }
    }

    /// Cancel everything for the symbol once; returns whether it succeeded
    pub async fn cancel_all(&self) -> bool {
        match self.trader.cancel_all_orders(&self.symbol).await {
            Ok(()) => {
                info!(symbol = %self.symbol, "cancelled all resting orders");
                true
            }
            Err(e) => {
                error!(symbol = %self.symbol, "Cannot cancel all orders: {}", e);
                false
            }
        }
    }

    /// Remaining size of an active order; `None` if gone or on error
    pub async fn remaining_size(&self, order_id: &OrderId) -> Option<Decimal> {
        match self.trader.remaining_size(order_id, &self.symbol).await {
            Ok(size) => size,
            Err(e) => {
                warn!(%order_id, "Cannot get remaining size: {}", e);
                None
            }
        }
    }

    /// Atomic cancel-and-replace; `None` on any failure
    pub async fn replace(
        &self,
        order_id: &OrderId,
        price: Decimal,
        size: Decimal,
        side: Side,
    ) -> Option<OrderId> {
        match self
            .trader
            .replace_order(order_id, &self.symbol, price, size, side)
            .await
        {
            Ok(new_id) if !new_id.is_empty() => Some(new_id),
            Ok(_) => {
                error!(%order_id, "venue returned an empty replacement id");
                None
            }
            Err(e) => {
                error!(%order_id, "Cannot replace order: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::PaperTrader;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn executor(paper: &Arc<PaperTrader>) -> OrderExecutor {
        OrderExecutor::new(paper.clone(), Symbol::new("ethusd"), Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_place_failure_is_none() {
        let paper = Arc::new(PaperTrader::new());
        let exec = executor(&paper);

        paper.fail_next_places(1);
        assert!(exec.place(dec("100"), dec("1"), Side::Long).await.is_none());
        assert!(exec.place(dec("100"), dec("1"), Side::Long).await.is_some());
        assert_eq!(paper.open_order_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_retries_until_success() {
        let paper = Arc::new(PaperTrader::new());
        let exec = executor(&paper);
        let id = exec.place(dec("100"), dec("1"), Side::Short).await.unwrap();

        paper.fail_next_cancels(3);
        assert!(exec.cancel(&id).await);
        assert_eq!(paper.cancel_attempts(), 4);
        assert_eq!(paper.open_order_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_rejection_is_final() {
        let paper = Arc::new(PaperTrader::new());
        let exec = executor(&paper);
        let id = exec.place(dec("100"), dec("1"), Side::Short).await.unwrap();

        paper.set_cancels_rejected(true);
        assert!(!exec.cancel(&id).await);
        assert_eq!(paper.cancel_attempts(), 1);
        assert_eq!(paper.open_order_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_of_unknown_order_returns() {
        let paper = Arc::new(PaperTrader::new());
        assert!(executor(&paper).cancel(&OrderId::from("ghost")).await);
        assert_eq!(paper.cancel_attempts(), 1);
    }

    #[tokio::test]
    async fn test_open_check_fails_safe() {
        let paper = Arc::new(PaperTrader::new());
        let exec = executor(&paper);

        paper.set_queries_failing(true);
        assert!(exec.is_open(&OrderId::from("ghost")).await);
        assert_eq!(exec.remaining_size(&OrderId::from("ghost")).await, None);

        paper.set_queries_failing(false);
        assert!(!exec.is_open(&OrderId::from("ghost")).await);
    }
}
