use std::sync::Arc;
use std::time::Duration;

use ephemera_ratelimit::RateLimiters;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodically drops stale rate-limiter state until `shutdown` turns `true`.
pub async fn sweep_rate_limits(
    limiters: Arc<RateLimiters>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = limiters.cleanup();
                debug!(removed, "swept rate limiter state");
            }
            _ = stop_requested(&mut shutdown) => break,
        }
    }
    info!("rate limiter sweep stopped");
}

async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
