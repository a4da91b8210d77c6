//! Background expiry of abandoned sessions

use super::SessionStore;
use crate::clock::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Spawn the sweep loop. It runs for the lifetime of the runtime.
pub fn spawn_sweeper(
    store: SessionStore,
    clock: Arc<dyn Clock>,
    every: Duration,
    ttl: Duration,
) -> JoinHandle<()> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);

    tokio::spawn(async move {
        tracing::info!(
            interval_secs = every.as_secs(),
            ttl_secs = ttl.num_seconds(),
            "Session sweeper started"
        );
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let expired = store.sweep_expired(clock.now(), ttl).await;
            for session_id in &expired {
                tracing::info!(session_id = %session_id, "Cleaned up stale session");
            }
            if !expired.is_empty() {
                tracing::debug!(count = expired.len(), "Sweep finished");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[tokio::test]
    async fn test_sweeper_expires_old_sessions() {
        let clock = Arc::new(ManualClock::at("2026-10-19T08:00:00Z"));
        let store = SessionStore::new();
        store.get_or_create("stale", "+27820000001", clock.now()).await;

        let handle = spawn_sweeper(
            store.clone(),
            clock.clone(),
            Duration::from_millis(10),
            Duration::from_secs(300),
        );

        clock.advance(chrono::Duration::minutes(6));
        store.get_or_create("live", "+27820000002", clock.now()).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(store.get("stale").await.is_none());
        assert!(store.get("live").await.is_some());
    }
}
