//! Gateway request and session counters
//!
//! Observability only. Nothing in the menu flow reads these back.

use crate::clock::Clock;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Day the `*_sessions` counters belong to
    pub day: NaiveDate,
    pub total_sessions_today: u64,
    pub successful_sessions: u64,
    pub failed_sessions: u64,
    pub request_count: u64,
    pub total_response_time_ms: u64,
    pub peak_sessions: usize,
    /// When the most recent session was created
    pub last_session_at: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
}

impl StatsSnapshot {
    /// Successful sessions as a percentage of today's sessions
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total_sessions_today == 0 {
            return 0.0;
        }
        self.successful_sessions as f64 / self.total_sessions_today as f64 * 100.0
    }

    pub fn average_response_time_ms(&self) -> u64 {
        self.total_response_time_ms
            .checked_div(self.request_count)
            .unwrap_or(0)
    }
}

/// Shared counters
pub struct Stats {
    inner: Mutex<StatsSnapshot>,
    clock: Arc<dyn Clock>,
}

impl Stats {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let inner = StatsSnapshot {
            day: clock.today(),
            total_sessions_today: 0,
            successful_sessions: 0,
            failed_sessions: 0,
            request_count: 0,
            total_response_time_ms: 0,
            peak_sessions: 0,
            last_session_at: None,
            started_at: clock.now(),
        };
        Self {
            inner: Mutex::new(inner),
            clock,
        }
    }

    /// A new session was created; `active` is the live count including it
    pub async fn session_started(&self, active: usize) {
        let mut stats = self.current().await;
        stats.total_sessions_today += 1;
        stats.peak_sessions = stats.peak_sessions.max(active);
        stats.last_session_at = Some(self.clock.now());
    }

    /// A ticket purchase completed
    pub async fn session_succeeded(&self) {
        self.current().await.successful_sessions += 1;
    }

    /// A session ended on invalid input or an unknown session id
    pub async fn session_failed(&self) {
        self.current().await.failed_sessions += 1;
    }

    pub async fn record_request(&self, elapsed: Duration) {
        let mut stats = self.inner.lock().await;
        stats.request_count += 1;
        stats.total_response_time_ms += u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        self.current().await.clone()
    }

    /// Lock the counters, resetting the daily ones first if the day changed
    async fn current(&self) -> tokio::sync::MutexGuard<'_, StatsSnapshot> {
        let today = self.clock.today();
        let mut stats = self.inner.lock().await;
        if stats.day != today {
            tracing::info!(
                previous = %stats.day,
                sessions = stats.total_sessions_today,
                "Day rolled over, resetting session counters"
            );
            stats.day = today;
            stats.total_sessions_today = 0;
            stats.successful_sessions = 0;
            stats.failed_sessions = 0;
        }
        stats
    }
}
