//! Core traits - The venue capability the grid engine consumes

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::{OrderId, Result, Side, Symbol};

/// Trader capability - implemented by venue adapters.
///
/// The engine depends only on this contract. Call policies (retries,
/// fail-safe defaults) live in [`crate::execution::OrderExecutor`], so
/// implementations just report what the venue said.
#[async_trait]
pub trait Trader: Send + Sync {
    /// Place a limit order, returning the venue's order id
    async fn place_order(
        &self,
        symbol: &Symbol,
        price: Decimal,
        size: Decimal,
        side: Side,
    ) -> Result<OrderId>;

    /// Whether the venue still lists the order as active
    async fn is_order_open(&self, order_id: &OrderId, symbol: &Symbol) -> Result<bool>;

    /// Cancel a single order
    async fn cancel_order(&self, order_id: &OrderId) -> Result<()>;

    /// Cancel every active order for the symbol
    async fn cancel_all_orders(&self, symbol: &Symbol) -> Result<()>;

    /// Remaining size of an active order, `None` if the venue does not list it
    async fn remaining_size(&self, order_id: &OrderId, symbol: &Symbol)
    -> Result<Option<Decimal>>;

    /// Atomic cancel-and-replace, returning the new order id
    async fn replace_order(
        &self,
        order_id: &OrderId,
        symbol: &Symbol,
        price: Decimal,
        size: Decimal,
        side: Side,
    ) -> Result<OrderId>;

    /// Venue name
    fn name(&self) -> &str;
}
