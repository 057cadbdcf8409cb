//! Grid Engine - serializes every read and write of the level grid
//!
//! One `tokio::sync::Mutex` guards the grid and its random source. Reset,
//! Reconcile and fill handling hold it for their whole run, venue calls
//! included. Pulse takes it once per level so fills for other levels can
//! interleave between steps.

pub mod runner;

pub use runner::{spawn_fill_consumer, spawn_pulser};

use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::core::{Error, Jitter, OrderId, Result, Side, Symbol};
use crate::execution::OrderExecutor;
use crate::grid::{GridParams, LevelGrid, LevelId};

/// Default reconcile iteration cap, per level
pub const DEFAULT_ITERATIONS_PER_LEVEL: usize = 4;

struct GridState {
    grid: LevelGrid,
    jitter: Box<dyn Jitter>,
}

/// What a reconcile pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub placed: usize,
    /// Crossing pairs resolved
    pub flipped: usize,
    /// Placements refused or flips postponed; retried on the next pass
    pub failed: usize,
}

/// Result of a fill notification for a known order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Venue still lists the order; notification ignored
    StillOpen,
    /// Level reverted and now waits to quote `side`
    Reverted { level: LevelId, side: Side },
}

/// What a pulse sweep did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PulseReport {
    pub requoted: usize,
    /// Order gone before it could be replaced
    pub skipped: usize,
    pub failed: usize,
    /// Replacement discarded: level changed or id owned elsewhere
    pub stale: usize,
}

pub struct GridEngine {
    executor: OrderExecutor,
    state: Mutex<GridState>,
    iterations_per_level: usize,
}

impl GridEngine {
    pub fn new(executor: OrderExecutor, jitter: Box<dyn Jitter>) -> Self {
        Self {
            executor,
            state: Mutex::new(GridState {
                grid: LevelGrid::new(),
                jitter,
            }),
            iterations_per_level: DEFAULT_ITERATIONS_PER_LEVEL,
        }
    }

    pub fn with_iterations_per_level(mut self, iterations: usize) -> Self {
        self.iterations_per_level = iterations.max(1);
        self
    }

    pub fn symbol(&self) -> &Symbol {
        self.executor.symbol()
    }

    /// Copy of the current grid
    pub async fn snapshot(&self) -> LevelGrid {
        self.state.lock().await.grid.clone()
    }

    /// Check the grid invariants under the lock
    pub async fn verify(&self) -> Result<()> {
        self.state.lock().await.grid.verify()
    }

    /// Cancel everything resting for the symbol and install a fresh ladder.
    ///
    /// The cancel is best-effort: the new grid knows nothing about earlier
    /// orders either way.
    pub async fn reset(&self, params: &GridParams) -> Result<()> {
        params.validate()?;

        let mut state = self.state.lock().await;
        if !self.executor.cancel_all().await {
            warn!(symbol = %self.symbol(), "reset continues with possibly resting orders");
        }

        let GridState { grid, jitter } = &mut *state;
        grid.reset(params, jitter.as_mut())?;

        info!(
            symbol = %self.symbol(),
            init_price = %params.init_price,
            delta = %params.delta,
            levels = grid.len(),
            generation = grid.generation(),
            "grid reset"
        );
        Ok(())
    }

    /// Drive every empty level to a placed quote or a flip, until no
    /// empty level is left to try.
    ///
    /// Levels whose placement fails, or whose crossing counterpart cannot
    /// be cancelled, stay empty and are not retried in this pass.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut state = self.state.lock().await;
        let GridState { grid, jitter } = &mut *state;

        let limit = self.iterations_per_level * grid.len() + 1;
        let mut report = ReconcileReport::default();
        let mut refused: HashSet<LevelId> = HashSet::new();
        let mut iterations = 0usize;

        loop {
            let Some(id) = grid.empty_levels().find(|id| !refused.contains(id)) else {
                break;
            };
            iterations += 1;
            if iterations > limit {
                error!(limit, ?report, "reconcile did not converge");
                return Err(Error::InvalidState(format!(
                    "reconcile exceeded {} iterations",
                    limit
                )));
            }

            if let Some(cross) = grid.find_crossing(id) {
                if let Some(order_id) = grid.level(cross).and_then(|l| l.current_order_id()).cloned() {
                    if !self.executor.cancel(&order_id).await {
                        // counterpart still rests; flipping would orphan it
                        warn!(%order_id, level = id, "flip postponed, crossing order not cancelled");
                        refused.insert(id);
                        report.failed += 1;
                        continue;
                    }
                }
                for flipped in [cross, id] {
                    grid.revert(flipped);
                    if let Some(level) = grid.level_mut(flipped) {
                        level.apply_size_pulse(jitter.as_mut());
                        info!(price_buy = %level.price_buy(), side = %level.side(), "flip level");
                    }
                }
                report.flipped += 1;
                continue;
            }

            let Some(level) = grid.level(id) else { break };
            let side = level.side();
            let size = level.actual_order_size();
            let price = level.actual_order_price(jitter.as_mut());
            let price_buy = level.price_buy();

            match self.executor.place(price, size, side).await {
                Some(order_id) => {
                    info!(%price_buy, %price, %size, %side, %order_id, "placed");
                    match grid.mark_placed(id, order_id.clone()) {
                        Ok(()) => report.placed += 1,
                        Err(e) => {
                            error!(%order_id, "cannot index placed order, cancelling: {}", e);
                            self.executor.cancel(&order_id).await;
                            refused.insert(id);
                            report.failed += 1;
                        }
                    }
                }
                None => {
                    refused.insert(id);
                    report.failed += 1;
                }
            }
        }

        debug!(?report, iterations, "reconcile done");
        Ok(report)
    }

    /// Revert the level owning `order_id` once the venue confirms the
    /// order is gone. Does not re-quote; call [`reconcile`](Self::reconcile).
    pub async fn handle_fill(&self, order_id: &OrderId) -> Result<FillOutcome> {
        let mut state = self.state.lock().await;
        let GridState { grid, jitter } = &mut *state;

        let id = grid
            .lookup_by_order(order_id)
            .ok_or_else(|| Error::UnknownOrder(order_id.clone()))?;

        if self.executor.is_open(order_id).await {
            debug!(%order_id, "fill notification for an order still open");
            return Ok(FillOutcome::StillOpen);
        }

        grid.revert(id);
        let level = grid
            .level_mut(id)
            .ok_or_else(|| Error::InvalidState(format!("indexed level {} missing", id)))?;
        level.apply_size_pulse(jitter.as_mut());
        info!(price_buy = %level.price_buy(), side = %level.side(), %order_id, "execute level");

        Ok(FillOutcome::Reverted {
            level: id,
            side: level.side(),
        })
    }

    /// Cancel-and-replace every placed quote at a freshly jittered price,
    /// keeping the remaining size.
    pub async fn pulse(&self) -> PulseReport {
        let mut report = PulseReport::default();
        let (generation, count) = {
            let state = self.state.lock().await;
            (state.grid.generation(), state.grid.len())
        };

        for id in 0..count {
            let mut state = self.state.lock().await;
            let GridState { grid, jitter } = &mut *state;
            if grid.generation() != generation {
                debug!("grid reset during pulse, stopping sweep");
                break;
            }

            let Some(level) = grid.level(id) else { break };
            let (Some(order_id), Some(side)) = (level.current_order_id().cloned(), level.order_side())
            else {
                continue;
            };
            let price = level.actual_order_price(jitter.as_mut());
            let price_buy = level.price_buy();

            let Some(size) = self.executor.remaining_size(&order_id).await else {
                debug!(%order_id, "pulse: order no longer active");
                report.skipped += 1;
                continue;
            };

            let Some(new_id) = self.executor.replace(&order_id, price, size, side).await else {
                report.failed += 1;
                continue;
            };

            if grid.rekey(id, &order_id, new_id.clone()) {
                info!(%price_buy, %price, %size, %side, old = %order_id, new = %new_id, "pulse");
                report.requoted += 1;
            } else {
                warn!(old = %order_id, new = %new_id, "level changed during pulse, dropping replacement");
                // never cancel an order another level owns
                if grid.lookup_by_order(&new_id).is_none() {
                    self.executor.cancel(&new_id).await;
                }
                report.stale += 1;
            }
        }

        debug!(?report, "pulse done");
        report
    }
}
