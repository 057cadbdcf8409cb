//! Long-running tasks driving the engine: fill consumer and pulser

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::{FillOutcome, GridEngine};
use crate::core::{Error, FillEvent};
use crate::feeds::FillReceiver;

/// Handle one notification, then re-quote the grid.
pub async fn process_fill(engine: &GridEngine, fill: &FillEvent) {
    info!(order_id = %fill.order_id, size = %fill.size, "TRADE");

    match engine.handle_fill(&fill.order_id).await {
        Ok(FillOutcome::Reverted { .. }) | Ok(FillOutcome::StillOpen) => {}
        Err(Error::UnknownOrder(id)) => {
            error!(order_id = %id, "Cannot find level by order id");
        }
        Err(e) => error!(order_id = %fill.order_id, "fill handling failed: {}", e),
    }

    if let Err(e) = engine.reconcile().await {
        error!("reconcile after fill failed: {}", e);
    }
}

/// Consume fills one at a time until every sender is dropped.
pub fn spawn_fill_consumer(engine: Arc<GridEngine>, fills: FillReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(symbol = %engine.symbol(), "📥 fill consumer started");
        while let Ok(fill) = fills.recv_async().await {
            process_fill(&engine, &fill).await;
        }
        warn!("fill feed closed, consumer stopping");
    })
}

/// Pulse the grid on a fixed period, forever.
pub fn spawn_pulser(engine: Arc<GridEngine>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(symbol = %engine.symbol(), ?period, "💓 pulser started");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately; quotes were just placed
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = engine.pulse().await;
            if report.failed > 0 || report.stale > 0 {
                warn!(?report, "pulse finished with failures");
            }
        }
    })
}
