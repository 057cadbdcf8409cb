//! REST trade poller - live fill feed for the venue

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::FillSender;
use crate::core::{FillEvent, OrderId, Symbol};
use crate::exchanges::rest::model::TradeRecord;
use crate::exchanges::RestTrader;

/// Trades fetched per poll
const TRADES_PER_POLL: usize = 100;

/// Trade ids remembered for de-duplication
const SEEN_CAPACITY: usize = 4_096;

/// Bounded set of trade ids already forwarded
struct SeenTrades {
    ids: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl SeenTrades {
    fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// True when the id was not seen before
    fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string());
        self.order.push_back(id.to_string());
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.ids.remove(&old);
            }
        }
        true
    }
}

/// Polls the venue's trade history and forwards each new trade once.
///
/// The first successful poll only seeds the seen-set; history from before
/// the engine started is never replayed.
pub struct TradePoller {
    client: Arc<RestTrader>,
    symbol: Symbol,
    period: Duration,
    seen: SeenTrades,
}

impl TradePoller {
    pub fn new(client: Arc<RestTrader>, symbol: Symbol, period: Duration) -> Self {
        Self {
            client,
            symbol,
            period,
            seen: SeenTrades::new(SEEN_CAPACITY),
        }
    }

    /// Unseen trades as fill events, oldest first
    fn fresh_fills(&mut self, trades: Vec<TradeRecord>) -> Vec<FillEvent> {
        trades
            .into_iter()
            .rev()
            .filter(|t| self.seen.insert(&t.id))
            .map(|t| {
                let mut fill = FillEvent::new(OrderId::new(t.order_id), t.base_volume.abs());
                fill.trade_id = Some(t.id);
                if let Some(ts) = t.timestamp {
                    fill.timestamp = ts;
                }
                fill
            })
            .collect()
    }

    async fn seed(&mut self) {
        loop {
            match self.client.trades(&self.symbol, TRADES_PER_POLL).await {
                Ok(trades) => {
                    let known = self.fresh_fills(trades).len();
                    info!(symbol = %self.symbol, known, "trade history seeded");
                    return;
                }
                Err(e) => {
                    warn!("Error on trade history read: {}", e);
                    tokio::time::sleep(self.period).await;
                }
            }
        }
    }

    /// Poll until the receiving side goes away
    pub async fn run(mut self, tx: FillSender) {
        self.seed().await;

        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let trades = match self.client.trades(&self.symbol, TRADES_PER_POLL).await {
                Ok(trades) => trades,
                Err(e) => {
                    warn!("Error on trade read: {}", e);
                    continue;
                }
            };

            for fill in self.fresh_fills(trades) {
                debug!(order_id = %fill.order_id, "new trade");
                if tx.send_async(fill).await.is_err() {
                    info!("fill receiver dropped, trade poller stopping");
                    return;
                }
            }
        }
    }

    pub fn spawn(self, tx: FillSender) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(id: &str, order: &str) -> TradeRecord {
        TradeRecord {
            id: id.to_string(),
            order_id: order.to_string(),
            asset_pair_id: "ETHUSD".to_string(),
            base_volume: "-0.001".parse().unwrap(),
            price: "351".parse().unwrap(),
            side: None,
            timestamp: None,
        }
    }

    fn poller() -> TradePoller {
        let client = RestTrader::new("https://venue.example", "key", Duration::from_secs(1)).unwrap();
        TradePoller::new(Arc::new(client), Symbol::new("ethusd"), Duration::from_secs(1))
    }

    #[test]
    fn test_fresh_fills_dedup_and_order() {
        let mut poller = poller();
        // venue returns newest first
        let fills = poller.fresh_fills(vec![trade("t2", "o2"), trade("t1", "o1")]);
        let orders: Vec<_> = fills.iter().map(|f| f.order_id.as_str().to_string()).collect();
        assert_eq!(orders, vec!["o1", "o2"]);
        assert_eq!(fills[0].size, "0.001".parse::<rust_decimal::Decimal>().unwrap());
        assert_eq!(fills[0].trade_id.as_deref(), Some("t1"));

        let fills = poller.fresh_fills(vec![trade("t3", "o1"), trade("t2", "o2"), trade("t1", "o1")]);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].trade_id.as_deref(), Some("t3"));
    }

    #[test]
    fn test_seen_set_is_bounded() {
        let mut seen = SeenTrades::new(2);
        assert!(seen.insert("a"));
        assert!(seen.insert("b"));
        assert!(!seen.insert("a"));
        assert!(seen.insert("c"));
        // "a" evicted
        assert!(seen.insert("a"));
        assert_eq!(seen.ids.len(), 2);
    }
}
