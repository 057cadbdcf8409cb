use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use pulse_grid::core::{Error, OrderId, Result, ScriptedJitter, Side, Symbol, Trader};
use pulse_grid::exchanges::PaperTrader;
use pulse_grid::{FillOutcome, GridEngine, GridParams, OrderExecutor};

/// Paper venue whose replaces can amend in place, answer with a chosen
/// id, or block until released.
#[derive(Default)]
struct ScriptedVenue {
    paper: PaperTrader,
    amend_in_place: AtomicBool,
    next_replace_id: Mutex<Option<OrderId>>,
    hold_replace: AtomicBool,
    replace_entered: Notify,
    release: Notify,
}

impl ScriptedVenue {
    fn hold_next_replace(&self) {
        self.hold_replace.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Trader for ScriptedVenue {
    async fn place_order(
        &self,
        symbol: &Symbol,
        price: Decimal,
        size: Decimal,
        side: Side,
    ) -> Result<OrderId> {
        self.paper.place_order(symbol, price, size, side).await
    }

    async fn is_order_open(&self, order_id: &OrderId, symbol: &Symbol) -> Result<bool> {
        self.paper.is_order_open(order_id, symbol).await
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        self.paper.cancel_order(order_id).await
    }

    async fn cancel_all_orders(&self, symbol: &Symbol) -> Result<()> {
        self.paper.cancel_all_orders(symbol).await
    }

    async fn remaining_size(
        &self,
        order_id: &OrderId,
        symbol: &Symbol,
    ) -> Result<Option<Decimal>> {
        self.paper.remaining_size(order_id, symbol).await
    }

    async fn replace_order(
        &self,
        order_id: &OrderId,
        symbol: &Symbol,
        price: Decimal,
        size: Decimal,
        side: Side,
    ) -> Result<OrderId> {
        if self.hold_replace.swap(false, Ordering::SeqCst) {
            self.replace_entered.notify_one();
            self.release.notified().await;
        }

        let forced = self.next_replace_id.lock().take();
        if let Some(id) = forced {
            return Ok(id);
        }
        if self.amend_in_place.load(Ordering::SeqCst) {
            return match self.paper.remaining_size(order_id, symbol).await? {
                Some(_) => Ok(order_id.clone()),
                None => Err(Error::OrderNotFound(order_id.clone())),
            };
        }
        self.paper.replace_order(order_id, symbol, price, size, side).await
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn params() -> GridParams {
    GridParams {
        init_price: dec("100"),
        level_min_size: dec("1"),
        delta: dec("1"),
        levels_per_side: 1,
        price_pulse_tick: dec("0.1"),
        price_pulse_max_ticks: 0,
        size_pulse_tick: Decimal::ZERO,
        size_pulse_max_ticks: 0,
    }
}

async fn quoted(venue: &Arc<ScriptedVenue>) -> Arc<GridEngine> {
    let executor = OrderExecutor::new(venue.clone(), Symbol::new("ethusd"), Duration::from_millis(1));
    let engine = Arc::new(GridEngine::new(executor, Box::new(ScriptedJitter::default())));
    engine.reset(&params()).await.unwrap();
    engine.reconcile().await.unwrap();
    engine
}

async fn order_of(engine: &GridEngine, level: usize) -> OrderId {
    engine
        .snapshot()
        .await
        .level(level)
        .and_then(|l| l.current_order_id())
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn test_amend_in_place_keeps_orders() {
    let venue = Arc::new(ScriptedVenue::default());
    let engine = quoted(&venue).await;
    venue.amend_in_place.store(true, Ordering::SeqCst);

    let before = engine.snapshot().await;
    let report = engine.pulse().await;
    assert_eq!(report.requoted, 2);
    assert_eq!(report.stale, 0);
    assert_eq!(venue.paper.cancel_attempts(), 0);
    assert_eq!(venue.paper.open_order_count(), 2);

    let after = engine.snapshot().await;
    assert_eq!(after.levels(), before.levels());
    after.verify().unwrap();

    // the kept id still resolves to its level
    let bid = order_of(&engine, 1).await;
    venue.paper.fill(&bid).unwrap();
    assert_eq!(
        engine.handle_fill(&bid).await.unwrap(),
        FillOutcome::Reverted { level: 1, side: Side::Short }
    );
}

#[tokio::test]
async fn test_replace_answering_foreign_id_is_dropped() {
    let venue = Arc::new(ScriptedVenue::default());
    let engine = quoted(&venue).await;
    let ask = order_of(&engine, 0).await;
    let bid = order_of(&engine, 1).await;

    // level 0's replace comes back with level 1's order id
    *venue.next_replace_id.lock() = Some(bid.clone());
    let report = engine.pulse().await;
    assert_eq!(report.stale, 1);
    assert_eq!(report.requoted, 1);
    assert_eq!(venue.paper.cancel_attempts(), 0);

    let grid = engine.snapshot().await;
    assert_eq!(grid.lookup_by_order(&ask), Some(0));
    assert_ne!(grid.level(1).unwrap().current_order_id(), Some(&bid));
    assert_eq!(venue.paper.open_order_count(), 2);
    grid.verify().unwrap();
}

#[tokio::test]
async fn test_fill_lands_between_pulse_levels() {
    let venue = Arc::new(ScriptedVenue::default());
    let engine = quoted(&venue).await;
    let bid = order_of(&engine, 1).await;

    venue.hold_next_replace();
    let pulser = tokio::spawn({
        let engine = engine.clone();
        async move { engine.pulse().await }
    });
    // level 0 is now inside its replace
    venue.replace_entered.notified().await;

    venue.paper.fill(&bid).unwrap();
    let filler = tokio::spawn({
        let engine = engine.clone();
        let bid = bid.clone();
        async move { engine.handle_fill(&bid).await }
    });
    // let the fill queue up on the grid lock
    tokio::time::sleep(Duration::from_millis(20)).await;
    venue.release.notify_one();

    let outcome = filler.await.unwrap().unwrap();
    assert_eq!(outcome, FillOutcome::Reverted { level: 1, side: Side::Short });

    // the sweep reached level 1 after the fill reverted it
    let report = pulser.await.unwrap();
    assert_eq!(report.requoted, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(venue.paper.replace_calls(), 1);

    let grid = engine.snapshot().await;
    assert!(!grid.level(1).unwrap().is_placed());
    grid.verify().unwrap();
}

#[tokio::test]
async fn test_reset_ends_pulse_sweep() {
    let venue = Arc::new(ScriptedVenue::default());
    let engine = quoted(&venue).await;

    venue.hold_next_replace();
    let pulser = tokio::spawn({
        let engine = engine.clone();
        async move { engine.pulse().await }
    });
    venue.replace_entered.notified().await;

    let resetter = tokio::spawn({
        let engine = engine.clone();
        async move { engine.reset(&params()).await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    venue.release.notify_one();

    resetter.await.unwrap().unwrap();
    let report = pulser.await.unwrap();
    assert_eq!(report.requoted, 1);
    assert_eq!(report.skipped + report.failed + report.stale, 0);
    assert_eq!(venue.paper.replace_calls(), 1);

    let grid = engine.snapshot().await;
    assert_eq!(grid.generation(), 2);
    assert_eq!(grid.order_count(), 0);
    assert_eq!(venue.paper.open_order_count(), 0);
}
