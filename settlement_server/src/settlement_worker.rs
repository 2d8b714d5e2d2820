use std::time::Duration;

use chrono::Utc;
use log::*;
use settlement_engine::payment_objects::SweepResult;
use tokio::task::JoinHandle;

use crate::queue_workers::FlowApi;

/// Starts the rider settlement sweep. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Each run pays the riders of delivered orders whose dispute window has closed and that the `rider.payment` queue
/// did not already settle.
pub fn start_settlement_worker(api: FlowApi, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Rider settlement worker started. Running every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            info!("🕰️ Running rider settlement job");
            match api.settle_delivered_orders(Utc::now()).await {
                Ok(result) => log_sweep(&result),
                Err(e) => error!("🕰️ Error running rider settlement job: {e}"),
            }
        }
    })
}

fn log_sweep(result: &SweepResult) {
    info!(
        "🕰️ Rider settlement job finished. {} orders processed, {} riders paid, {} failed",
        result.processed_count(),
        result.paid_count(),
        result.failed_count()
    );
    for (order_id, reason) in &result.failed {
        warn!("🕰️ Could not settle order #{order_id}. {reason}");
    }
}
