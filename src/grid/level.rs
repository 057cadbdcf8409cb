//! Single rung of the price ladder

use rust_decimal::Decimal;

use crate::core::{Jitter, LevelStatus, OrderId, Side};

/// One rung of the ladder, quoting one side at a time.
///
/// Prices, spacing and jitter settings are fixed when the grid is built;
/// only `side`, `status` and `actual_order_size` move afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    price_buy: Decimal,
    price_sell: Decimal,
    delta: Decimal,
    min_size: Decimal,
    actual_order_size: Decimal,
    side: Side,
    status: LevelStatus,
    price_pulse_tick: Decimal,
    price_pulse_max_ticks: u32,
    size_pulse_tick: Decimal,
    size_pulse_max_ticks: u32,
}

/// Jitter settings shared by every level of one grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseSettings {
    pub price_tick: Decimal,
    pub price_max_ticks: u32,
    pub size_tick: Decimal,
    pub size_max_ticks: u32,
}

impl Level {
    pub fn new(
        price_buy: Decimal,
        delta: Decimal,
        min_size: Decimal,
        side: Side,
        pulse: PulseSettings,
    ) -> Self {
        Self {
            price_buy,
            price_sell: price_buy + delta,
            delta,
            min_size,
            actual_order_size: min_size,
            side,
            status: LevelStatus::Empty,
            price_pulse_tick: pulse.price_tick,
            price_pulse_max_ticks: pulse.price_max_ticks,
            size_pulse_tick: pulse.size_tick,
            size_pulse_max_ticks: pulse.size_max_ticks,
        }
    }

    pub fn price_buy(&self) -> Decimal {
        self.price_buy
    }

    pub fn price_sell(&self) -> Decimal {
        self.price_sell
    }

    pub fn delta(&self) -> Decimal {
        self.delta
    }

    pub fn min_size(&self) -> Decimal {
        self.min_size
    }

    pub fn actual_order_size(&self) -> Decimal {
        self.actual_order_size
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn status(&self) -> &LevelStatus {
        &self.status
    }

    pub fn is_placed(&self) -> bool {
        self.status.is_placed()
    }

    pub fn current_order_id(&self) -> Option<&OrderId> {
        self.status.order_id()
    }

    /// Side of the outstanding order, if any
    pub fn order_side(&self) -> Option<Side> {
        match &self.status {
            LevelStatus::Placed { order_side, .. } => Some(*order_side),
            LevelStatus::Empty => None,
        }
    }

    /// Unjittered quote price: buy price when Long, sell price when Short
    pub fn original_order_price(&self) -> Decimal {
        match self.side {
            Side::Long => self.price_buy,
            Side::Short => self.price_sell,
        }
    }

    /// Quote price shifted by a fresh draw in `[-max_ticks, max_ticks)` ticks
    pub fn actual_order_price(&self, jitter: &mut dyn Jitter) -> Decimal {
        let max = self.price_pulse_max_ticks;
        let draw = jitter.below(max.saturating_mul(2));
        let ticks = i64::from(draw) - i64::from(max);
        self.original_order_price() + Decimal::from(ticks) * self.price_pulse_tick
    }

    /// Adds `[0, size_max_ticks)` size ticks on top of the current size.
    pub fn apply_size_pulse(&mut self, jitter: &mut dyn Jitter) {
        let ticks = jitter.below(self.size_pulse_max_ticks);
        self.actual_order_size += Decimal::from(ticks) * self.size_pulse_tick;
    }

    pub(crate) fn mark_placed(&mut self, order_id: OrderId, order_side: Side) {
        self.status = LevelStatus::Placed {
            order_id,
            order_side,
        };
    }

    /// Swap the order id of a placed level, keeping its side.
    pub(crate) fn replace_order_id(&mut self, new_id: OrderId) -> Option<OrderId> {
        match &mut self.status {
            LevelStatus::Placed { order_id, .. } => Some(std::mem::replace(order_id, new_id)),
            LevelStatus::Empty => None,
        }
    }

    /// Flip side, drop the order and fall back to the minimum size.
    ///
    /// Returns the order id the level carried, if any.
    pub fn revert(&mut self) -> Option<OrderId> {
        self.side = self.side.opposite();
        self.actual_order_size = self.min_size.abs();
        match std::mem::replace(&mut self.status, LevelStatus::Empty) {
            LevelStatus::Placed { order_id, .. } => Some(order_id),
            LevelStatus::Empty => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ScriptedJitter;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn pulse() -> PulseSettings {
        PulseSettings {
            price_tick: dec("0.1"),
            price_max_ticks: 4,
            size_tick: dec("0.01"),
            size_max_ticks: 3,
        }
    }

    #[test]
    fn test_quote_price_follows_side() {
        let mut level = Level::new(dec("99"), dec("1"), dec("0.5"), Side::Long, pulse());
        assert_eq!(level.price_sell(), dec("100"));
        assert_eq!(level.original_order_price(), dec("99"));

        level.revert();
        assert_eq!(level.side(), Side::Short);
        assert_eq!(level.original_order_price(), dec("100"));
    }

    #[test]
    fn test_price_jitter_range() {
        let level = Level::new(dec("100"), dec("1"), dec("1"), Side::Long, pulse());

        // draw 0 -> -4 ticks, draw 7 -> +3 ticks, draw 4 -> unchanged
        let mut jitter = ScriptedJitter::new(vec![0, 7, 4]);
        assert_eq!(level.actual_order_price(&mut jitter), dec("99.6"));
        assert_eq!(level.actual_order_price(&mut jitter), dec("100.3"));
        assert_eq!(level.actual_order_price(&mut jitter), dec("100"));
    }

    #[test]
    fn test_no_price_jitter_when_max_ticks_zero() {
        let settings = PulseSettings {
            price_max_ticks: 0,
            ..pulse()
        };
        let level = Level::new(dec("100"), dec("1"), dec("1"), Side::Short, settings);
        let mut jitter = ScriptedJitter::constant(3);
        assert_eq!(level.actual_order_price(&mut jitter), dec("101"));
    }

    #[test]
    fn test_size_pulse_never_below_min() {
        let mut level = Level::new(dec("100"), dec("1"), dec("0.5"), Side::Long, pulse());
        let mut jitter = ScriptedJitter::new(vec![0, 1, 2, 5]);
        for _ in 0..4 {
            level.apply_size_pulse(&mut jitter);
            assert!(level.actual_order_size() >= level.min_size());
        }
        // 0 + 1 + 2 + (5 % 3) ticks of 0.01
        assert_eq!(level.actual_order_size(), dec("0.55"));
    }

    #[test]
    fn test_revert_clears_order_and_size() {
        let mut level = Level::new(dec("100"), dec("1"), dec("0.5"), Side::Long, pulse());
        level.apply_size_pulse(&mut ScriptedJitter::constant(2));
        level.mark_placed(OrderId::from("A1"), Side::Long);
        assert!(level.is_placed());
        assert_eq!(level.order_side(), Some(Side::Long));

        let old = level.revert();
        assert_eq!(old, Some(OrderId::from("A1")));
        assert_eq!(level.side(), Side::Short);
        assert_eq!(level.status(), &LevelStatus::Empty);
        assert_eq!(level.current_order_id(), None);
        assert_eq!(level.actual_order_size(), dec("0.5"));
    }

    #[test]
    fn test_replace_order_id_keeps_side() {
        let mut level = Level::new(dec("100"), dec("1"), dec("0.5"), Side::Short, pulse());
        assert_eq!(level.replace_order_id(OrderId::from("X")), None);

        level.mark_placed(OrderId::from("A1"), Side::Short);
        let old = level.replace_order_id(OrderId::from("B2"));
        assert_eq!(old, Some(OrderId::from("A1")));
        assert_eq!(level.current_order_id(), Some(&OrderId::from("B2")));
        assert_eq!(level.order_side(), Some(Side::Short));
    }
}
