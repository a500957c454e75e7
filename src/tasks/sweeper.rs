use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::store::TaskStore;

/// Periodic TTL sweep over the task registry.
///
/// A single long-lived loop spawned at startup: every `interval` it removes
/// tasks older than `ttl`, keeping the registry bounded without touching the
/// request path. Runs until the cancellation token is triggered.
pub async fn run(
    store: Arc<TaskStore>,
    ttl: time::Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        ttl_hours = ttl.whole_hours(),
        interval_secs = interval.as_secs(),
        "task sweeper started"
    );

    let mut ticker = tokio::time::interval(interval);
    // the first tick fires immediately, which would sweep at startup; skip it
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("task sweeper shutting down");
                break;
            }
            _ = ticker.tick() => {
                let removed = store.sweep_expired(ttl);
                if removed == 0 {
                    tracing::debug!("task sweeper: nothing to remove");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::store::TaskType;
    use uuid::Uuid;

    #[tokio::test(start_paused = true)]
    async fn sweeper_stops_on_cancellation() {
        let store = Arc::new(TaskStore::new());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&store),
            time::Duration::hours(24),
            Duration::from_secs(3600),
            cancel.clone(),
        ));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_tasks_survive_a_sweep_cycle() {
        let store = Arc::new(TaskStore::new());
        let task = store.create(TaskType::GlucoseTrend, Uuid::new_v4(), Uuid::new_v4());

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&store),
            time::Duration::hours(24),
            Duration::from_secs(3600),
            cancel.clone(),
        ));

        // run past a couple of sweep ticks under paused time
        tokio::time::sleep(Duration::from_secs(7300)).await;
        assert!(store.get(task.id).is_some());

        cancel.cancel();
        handle.await.unwrap();
    }
}
