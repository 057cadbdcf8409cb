//! Simulated market for paper mode: a random walk that trades through
//! resting paper orders.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::FillSender;
use crate::core::{FillEvent, Jitter};
use crate::exchanges::PaperTrader;

pub struct RandomWalkFeed {
    paper: Arc<PaperTrader>,
    mid: Decimal,
    step: Decimal,
    max_ticks: u32,
    interval: Duration,
    jitter: Box<dyn Jitter>,
}

impl RandomWalkFeed {
    /// Walk starting at `mid`, moving up to `max_ticks * step` per interval.
    pub fn new(
        paper: Arc<PaperTrader>,
        mid: Decimal,
        step: Decimal,
        max_ticks: u32,
        interval: Duration,
        jitter: Box<dyn Jitter>,
    ) -> Self {
        Self {
            paper,
            mid,
            step,
            max_ticks,
            interval,
            jitter,
        }
    }

    pub fn mid(&self) -> Decimal {
        self.mid
    }

    /// Move the mid once and fill every order it trades through
    pub fn step(&mut self) -> Vec<FillEvent> {
        let span = self.max_ticks.saturating_mul(2).saturating_add(1);
        let ticks = i64::from(self.jitter.below(span)) - i64::from(self.max_ticks);
        self.mid += self.step * Decimal::from(ticks);
        self.paper.cross(self.mid)
    }

    pub async fn run(mut self, tx: FillSender) {
        info!(mid = %self.mid, step = %self.step, "📈 random walk started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let fills = self.step();
            debug!(mid = %self.mid, fills = fills.len(), "walk");
            for fill in fills {
                if tx.send_async(fill).await.is_err() {
                    info!("fill receiver dropped, random walk stopping");
                    return;
                }
            }
        }
    }

    pub fn spawn(self, tx: FillSender) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }
}
