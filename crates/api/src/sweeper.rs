//! Background housekeeping: promotion expiry and token purging.

use std::time::{Duration, Instant};

use marketplace::{AccountService, PromotionService};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Runs [`PromotionService::expire_stale`] and then
/// [`AccountService::purge_expired_tokens`] every `every` until `shutdown`
/// flips to true or its sender is dropped.
///
/// The first sweep runs immediately. A failed sweep is logged and retried on
/// the next tick.
pub fn spawn_expiry_sweeper(
    promotions: PromotionService,
    accounts: AccountService,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let started = Instant::now();
                    match promotions.expire_stale().await {
                        Ok(summary) => {
                            tracing::debug!(expired_count = summary.expired_count, "expiry sweep finished");
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "expiry sweep failed");
                        }
                    }
                    metrics::histogram!("promotion_sweep_duration_seconds")
                        .record(started.elapsed().as_secs_f64());

                    accounts.purge_expired_tokens();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("expiry sweeper stopped");
                        break;
                    }
                }
            }
        }
    })
}
