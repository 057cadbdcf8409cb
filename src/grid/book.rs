//! Level grid - the ladder plus the order-id index

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::{Error, Jitter, OrderId, Result, Side};

use super::level::{Level, PulseSettings};

/// Position of a level inside the grid; stable until the next reset
pub type LevelId = usize;

/// Ladder parameters applied by a reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridParams {
    /// Reference price the ladder is centred on
    pub init_price: Decimal,
    /// Base order size of every level
    pub level_min_size: Decimal,
    /// Spacing between rungs, also the buy/sell offset of a level
    pub delta: Decimal,
    pub levels_per_side: usize,
    pub price_pulse_tick: Decimal,
    pub price_pulse_max_ticks: u32,
    pub size_pulse_tick: Decimal,
    pub size_pulse_max_ticks: u32,
}

impl GridParams {
    pub fn validate(&self) -> Result<()> {
        if self.delta <= Decimal::ZERO {
            return Err(Error::InvalidParams(format!("delta must be positive, got {}", self.delta)));
        }
        if self.level_min_size <= Decimal::ZERO {
            return Err(Error::InvalidParams(format!(
                "level_min_size must be positive, got {}",
                self.level_min_size
            )));
        }
        if self.price_pulse_tick < Decimal::ZERO || self.size_pulse_tick < Decimal::ZERO {
            return Err(Error::InvalidParams("pulse ticks must not be negative".to_string()));
        }

        // lowest Long level buys at init - N * delta
        let lowest_bid = self.init_price - self.delta * Decimal::from(self.levels_per_side);
        if self.init_price <= Decimal::ZERO || lowest_bid <= Decimal::ZERO {
            return Err(Error::InvalidParams(format!(
                "ladder reaches a non-positive price: {} - {} x {} = {}",
                self.init_price, self.levels_per_side, self.delta, lowest_bid
            )));
        }
        Ok(())
    }

    fn pulse_settings(&self) -> PulseSettings {
        PulseSettings {
            price_tick: self.price_pulse_tick,
            price_max_ticks: self.price_pulse_max_ticks,
            size_tick: self.size_pulse_tick,
            size_max_ticks: self.size_pulse_max_ticks,
        }
    }
}

/// In-memory ladder. Pure state, no I/O.
///
/// Invariants after every public mutation:
/// - each placed level owns exactly one index entry keyed by its order id,
///   and every index entry points at a placed level carrying that id;
/// - no placed Long quote is priced at or above a placed Short quote.
#[derive(Debug, Clone, Default)]
pub struct LevelGrid {
    levels: Vec<Level>,
    by_order: HashMap<OrderId, LevelId>,
    generation: u64,
}

impl LevelGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole ladder.
    ///
    /// Shorts are stored first (ascending, sell price `init + k*delta`),
    /// then Longs (descending, buy price `init - k*delta`), all empty.
    /// Each level gets its own size jitter.
    pub fn reset(&mut self, params: &GridParams, jitter: &mut dyn Jitter) -> Result<()> {
        params.validate()?;

        let pulse = params.pulse_settings();
        let n = params.levels_per_side;
        let mut levels = Vec::with_capacity(n * 2);

        let mut price = params.init_price;
        for _ in 0..n {
            let mut level =
                Level::new(price, params.delta, params.level_min_size, Side::Short, pulse);
            level.apply_size_pulse(jitter);
            levels.push(level);
            price += params.delta;
        }

        let mut price = params.init_price - params.delta;
        for _ in 0..n {
            let mut level =
                Level::new(price, params.delta, params.level_min_size, Side::Long, pulse);
            level.apply_size_pulse(jitter);
            levels.push(level);
            price -= params.delta;
        }

        self.levels = levels;
        self.by_order.clear();
        self.generation += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Bumped on every reset; lets callers detect a swapped ladder
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, id: LevelId) -> Option<&Level> {
        self.levels.get(id)
    }

    pub(crate) fn level_mut(&mut self, id: LevelId) -> Option<&mut Level> {
        self.levels.get_mut(id)
    }

    pub fn lookup_by_order(&self, order_id: &OrderId) -> Option<LevelId> {
        self.by_order.get(order_id).copied()
    }

    pub fn order_count(&self) -> usize {
        self.by_order.len()
    }

    /// Order id -> level entries, in no particular order
    pub fn order_index(&self) -> impl Iterator<Item = (&OrderId, LevelId)> + '_ {
        self.by_order.iter().map(|(id, level)| (id, *level))
    }

    pub fn empty_levels(&self) -> impl Iterator<Item = LevelId> + '_ {
        self.levels
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.is_placed())
            .map(|(id, _)| id)
    }

    pub fn placed_levels(&self) -> impl Iterator<Item = LevelId> + '_ {
        self.levels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_placed())
            .map(|(id, _)| id)
    }

    /// Placed levels whose order side differs from `side`, nearest to a
    /// crossing first: Short quotes by ascending sell price when `side` is
    /// Long, Long quotes by descending buy price when `side` is Short.
    /// Equal prices keep storage order.
    pub fn opposing_placed_levels(&self, side: Side) -> Vec<LevelId> {
        let mut ids: Vec<LevelId> = self
            .levels
            .iter()
            .enumerate()
            .filter(|(_, l)| matches!(l.order_side(), Some(s) if s != side))
            .map(|(id, _)| id)
            .collect();

        match side {
            Side::Long => ids.sort_by_key(|&id| self.levels[id].price_sell()),
            Side::Short => ids.sort_by_key(|&id| std::cmp::Reverse(self.levels[id].price_buy())),
        }
        ids
    }

    /// Opposing placed level that the quote of `id` would cross.
    ///
    /// Compares the unjittered quote price so the answer does not depend
    /// on the random source.
    pub fn find_crossing(&self, id: LevelId) -> Option<LevelId> {
        let level = self.levels.get(id)?;
        let side = level.side();
        let price = level.original_order_price();

        let nearest = *self.opposing_placed_levels(side).first()?;
        let other = &self.levels[nearest];
        let crosses = match side {
            Side::Long => other.price_sell() <= price,
            Side::Short => other.price_buy() >= price,
        };
        crosses.then_some(nearest)
    }

    /// Record a successful placement for an empty level.
    pub fn mark_placed(&mut self, id: LevelId, order_id: OrderId) -> Result<()> {
        if order_id.is_empty() {
            return Err(Error::InvalidState(format!("empty order id for level {}", id)));
        }
        if let Some(owner) = self.by_order.get(&order_id) {
            return Err(Error::InvalidState(format!(
                "order {} already owned by level {}",
                order_id, owner
            )));
        }
        let level = self
            .levels
            .get_mut(id)
            .ok_or_else(|| Error::InvalidState(format!("no level {}", id)))?;
        if level.is_placed() {
            return Err(Error::InvalidState(format!("level {} already placed", id)));
        }

        let side = level.side();
        level.mark_placed(order_id.clone(), side);
        self.by_order.insert(order_id, id);
        Ok(())
    }

    /// Revert a level and drop its index entry. Returns the order it held.
    pub fn revert(&mut self, id: LevelId) -> Option<OrderId> {
        let old = self.levels.get_mut(id)?.revert();
        if let Some(order_id) = &old {
            self.by_order.remove(order_id);
        }
        old
    }

    /// Move a placed level from `expected` to `new_id`.
    ///
    /// A venue that amends in place answers with `expected` itself; that
    /// is accepted as is. Returns false, changing nothing, when the level
    /// no longer carries `expected` or `new_id` belongs to another level.
    pub fn rekey(&mut self, id: LevelId, expected: &OrderId, new_id: OrderId) -> bool {
        let Some(level) = self.levels.get_mut(id) else {
            return false;
        };
        if level.current_order_id() != Some(expected) {
            return false;
        }
        if new_id == *expected {
            return true;
        }
        if self.by_order.contains_key(&new_id) {
            return false;
        }
        level.replace_order_id(new_id.clone());
        self.by_order.remove(expected);
        self.by_order.insert(new_id, id);
        true
    }

    /// Check the index and no-crossing invariants.
    pub fn verify(&self) -> Result<()> {
        for (order_id, &id) in &self.by_order {
            let level = self.levels.get(id).ok_or_else(|| {
                Error::InvalidState(format!("order {} points at missing level {}", order_id, id))
            })?;
            if level.current_order_id() != Some(order_id) {
                return Err(Error::InvalidState(format!(
                    "order {} indexed to level {} which carries {:?}",
                    order_id,
                    id,
                    level.current_order_id()
                )));
            }
        }

        let placed = self.placed_levels().count();
        if placed != self.by_order.len() {
            return Err(Error::InvalidState(format!(
                "{} placed levels but {} index entries",
                placed,
                self.by_order.len()
            )));
        }

        let highest_bid = self
            .levels
            .iter()
            .filter(|l| l.order_side() == Some(Side::Long))
            .map(|l| l.price_buy())
            .max();
        let lowest_ask = self
            .levels
            .iter()
            .filter(|l| l.order_side() == Some(Side::Short))
            .map(|l| l.price_sell())
            .min();
        if let (Some(bid), Some(ask)) = (highest_bid, lowest_ask) {
            if bid >= ask {
                return Err(Error::InvalidState(format!(
                    "crossed quotes: long {} >= short {}",
                    bid, ask
                )));
            }
        }
        Ok(())
    }
}
