//! Periodic cache maintenance.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vidqa_core::KeyedCache;

/// Sweep expired entries from `cache` every `every` until `cancel` fires.
///
/// Reads already ignore expired entries, so this only bounds memory.
pub fn spawn_cache_sweeper<V>(
    cache: Arc<KeyedCache<V>>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Cache sweeper stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = cache.remove_expired();
                    if removed > 0 {
                        debug!(removed, remaining = cache.len(), "Swept expired cache entries");
                    }
                }
            }
        }
    })
}
