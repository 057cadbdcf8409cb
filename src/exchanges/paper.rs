//! Paper venue - in-memory order book for tests and dry runs

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::{Error, FillEvent, OrderId, Result, Side, Symbol, Trader};

/// Resting paper order
#[derive(Debug, Clone, PartialEq)]
pub struct PaperOrder {
    pub id: OrderId,
    pub symbol: Symbol,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub remaining: Decimal,
}

#[derive(Default)]
struct PaperBook {
    orders: HashMap<OrderId, PaperOrder>,
    fail_places: u32,
    fail_cancels: u32,
    reject_cancels: bool,
    fail_replaces: u32,
    queries_failing: bool,
    place_calls: u32,
    cancel_calls: u32,
    replace_calls: u32,
}

/// In-memory trader.
///
/// Orders rest until cancelled, replaced or filled through [`fill`],
/// [`partial_fill`] or [`cross`]. Failures can be injected per call kind.
///
/// [`fill`]: PaperTrader::fill
/// [`partial_fill`]: PaperTrader::partial_fill
/// [`cross`]: PaperTrader::cross
#[derive(Default)]
pub struct PaperTrader {
    book: Mutex<PaperBook>,
}

impl PaperTrader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `n` placements
    pub fn fail_next_places(&self, n: u32) {
        self.book.lock().fail_places = n;
    }

    /// Make the next `n` single-order cancels fail as if unreachable
    pub fn fail_next_cancels(&self, n: u32) {
        self.book.lock().fail_cancels = n;
    }

    /// Reject every single-order cancel until switched off
    pub fn set_cancels_rejected(&self, rejected: bool) {
        self.book.lock().reject_cancels = rejected;
    }

    /// Reject the next `n` replaces
    pub fn fail_next_replaces(&self, n: u32) {
        self.book.lock().fail_replaces = n;
    }

    /// Make open-order and remaining-size queries error out
    pub fn set_queries_failing(&self, failing: bool) {
        self.book.lock().queries_failing = failing;
    }

    pub fn place_calls(&self) -> u32 {
        self.book.lock().place_calls
    }

    pub fn cancel_attempts(&self) -> u32 {
        self.book.lock().cancel_calls
    }

    pub fn replace_calls(&self) -> u32 {
        self.book.lock().replace_calls
    }

    pub fn open_order_count(&self) -> usize {
        self.book.lock().orders.len()
    }

    pub fn order(&self, order_id: &OrderId) -> Option<PaperOrder> {
        self.book.lock().orders.get(order_id).cloned()
    }

    /// Resting orders, highest price first
    pub fn open_orders(&self) -> Vec<PaperOrder> {
        let mut orders: Vec<_> = self.book.lock().orders.values().cloned().collect();
        orders.sort_by(|a, b| b.price.cmp(&a.price).then_with(|| a.id.as_str().cmp(b.id.as_str())));
        orders
    }

    /// Fill the whole remaining size of an order
    pub fn fill(&self, order_id: &OrderId) -> Option<FillEvent> {
        let order = self.book.lock().orders.remove(order_id)?;
        Some(FillEvent::new(order.id, order.remaining))
    }

    /// Fill part of an order; it stays open while size remains
    pub fn partial_fill(&self, order_id: &OrderId, size: Decimal) -> Option<FillEvent> {
        let mut book = self.book.lock();
        let order = book.orders.get_mut(order_id)?;
        let filled = size.min(order.remaining);
        order.remaining -= filled;
        if order.remaining <= Decimal::ZERO {
            book.orders.remove(order_id);
        }
        Some(FillEvent::new(order_id.clone(), filled))
    }

    /// Trade at `price`: fills every buy at or above it and every sell at
    /// or below it.
    pub fn cross(&self, price: Decimal) -> Vec<FillEvent> {
        let mut book = self.book.lock();
        let hit: Vec<OrderId> = book
            .orders
            .values()
            .filter(|o| match o.side {
                Side::Long => o.price >= price,
                Side::Short => o.price <= price,
            })
            .map(|o| o.id.clone())
            .collect();

        hit.into_iter()
            .filter_map(|id| book.orders.remove(&id))
            .map(|o| FillEvent::new(o.id, o.remaining))
            .collect()
    }

    fn insert(book: &mut PaperBook, symbol: &Symbol, price: Decimal, size: Decimal, side: Side) -> OrderId {
        let id = OrderId::new(Uuid::new_v4().to_string());
        book.orders.insert(
            id.clone(),
            PaperOrder {
                id: id.clone(),
                symbol: symbol.clone(),
                side,
                price,
                size,
                remaining: size,
            },
        );
        id
    }
}

#[async_trait]
impl Trader for PaperTrader {
    async fn place_order(
        &self,
        symbol: &Symbol,
        price: Decimal,
        size: Decimal,
        side: Side,
    ) -> Result<OrderId> {
        let mut book = self.book.lock();
        book.place_calls += 1;
        if book.fail_places > 0 {
            book.fail_places -= 1;
            return Err(Error::Exchange("paper: placement rejected".to_string()));
        }
        if size <= Decimal::ZERO {
            return Err(Error::Exchange(format!("paper: invalid size {}", size)));
        }
        Ok(Self::insert(&mut book, symbol, price, size, side))
    }

    async fn is_order_open(&self, order_id: &OrderId, symbol: &Symbol) -> Result<bool> {
        let book = self.book.lock();
        if book.queries_failing {
            return Err(Error::Exchange("paper: query unavailable".to_string()));
        }
        Ok(book.orders.get(order_id).is_some_and(|o| &o.symbol == symbol))
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        let mut book = self.book.lock();
        book.cancel_calls += 1;
        if book.fail_cancels > 0 {
            book.fail_cancels -= 1;
            return Err(Error::Unavailable("paper: cancel timed out".to_string()));
        }
        if book.reject_cancels {
            return Err(Error::Exchange("paper: cancel rejected".to_string()));
        }
        book.orders
            .remove(order_id)
            .map(|_| ())
            .ok_or_else(|| Error::OrderNotFound(order_id.clone()))
    }

    async fn cancel_all_orders(&self, symbol: &Symbol) -> Result<()> {
        self.book.lock().orders.retain(|_, o| &o.symbol != symbol);
        Ok(())
    }

    async fn remaining_size(
        &self,
        order_id: &OrderId,
        symbol: &Symbol,
    ) -> Result<Option<Decimal>> {
        let book = self.book.lock();
        if book.queries_failing {
            return Err(Error::Exchange("paper: query unavailable".to_string()));
        }
        Ok(book
            .orders
            .get(order_id)
            .filter(|o| &o.symbol == symbol)
            .map(|o| o.remaining))
    }

    async fn replace_order(
        &self,
        order_id: &OrderId,
        symbol: &Symbol,
        price: Decimal,
        size: Decimal,
        side: Side,
    ) -> Result<OrderId> {
        let mut book = self.book.lock();
        book.replace_calls += 1;
        if book.fail_replaces > 0 {
            book.fail_replaces -= 1;
            return Err(Error::Exchange("paper: replace rejected".to_string()));
        }
        if book.orders.remove(order_id).is_none() {
            return Err(Error::OrderNotFound(order_id.clone()));
        }
        Ok(Self::insert(&mut book, symbol, price, size, side))
    }

    fn name(&self) -> &str {
        "paper"
    }
}
