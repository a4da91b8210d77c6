//! Revenue ledger
//!
//! Confirmed revenue is accumulated as purchases complete. Pending revenue
//! is tracked incrementally as fares are reserved and released, but the
//! value reported is always recomputed from the live sessions so expired or
//! abandoned sessions can never leak into it.
//!
//! A purchase leaves the session store before it is confirmed here, and the
//! recompute reads the store while holding the ledger lock. A fare is
//! therefore never reported as both pending and confirmed.

use crate::clock::Clock;
use crate::session::{Session, SessionStore};
use crate::stats::StatsSnapshot;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Ledger totals at a point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub confirmed_total: Decimal,
    pub pending_total: Decimal,
    pub total_revenue: Decimal,
    pub revenue_today: Decimal,
    pub tickets_sold: u64,
    pub tickets_today: u64,
    /// Day `revenue_today` and `tickets_today` belong to
    pub day: NaiveDate,
}

/// Ledger totals plus derived ratios, as reported to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueMetrics {
    pub confirmed_total: Decimal,
    pub pending_total: Decimal,
    pub total_revenue: Decimal,
    pub revenue_today: Decimal,
    pub tickets_sold: u64,
    pub tickets_today: u64,
    /// Successful sessions per 100 sessions today
    pub conversion_rate: f64,
    pub average_ticket_price: Decimal,
}

/// Concurrently updated revenue totals
pub struct RevenueLedger {
    inner: Mutex<LedgerSnapshot>,
    clock: Arc<dyn Clock>,
}

impl RevenueLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let inner = LedgerSnapshot {
            confirmed_total: Decimal::ZERO,
            pending_total: Decimal::ZERO,
            total_revenue: Decimal::ZERO,
            revenue_today: Decimal::ZERO,
            tickets_sold: 0,
            tickets_today: 0,
            day: clock.today(),
        };
        Self {
            inner: Mutex::new(inner),
            clock,
        }
    }

    /// A fare was reserved on the confirmation screen
    pub async fn add_pending(&self, amount: Decimal) {
        self.inner.lock().await.pending_total += amount;
    }

    /// A reserved fare was abandoned
    pub async fn release_pending(&self, amount: Decimal) {
        let mut ledger = self.inner.lock().await;
        ledger.pending_total = floored_sub(ledger.pending_total, amount);
    }

    /// Move `amount` from pending to confirmed and count the ticket
    pub async fn confirm_purchase(&self, amount: Decimal) {
        let mut ledger = self.current().await;
        ledger.pending_total = floored_sub(ledger.pending_total, amount);
        ledger.confirmed_total += amount;
        ledger.total_revenue += amount;
        ledger.revenue_today += amount;
        ledger.tickets_sold += 1;
        ledger.tickets_today += 1;
        tracing::info!(
            amount = %amount,
            confirmed_total = %ledger.confirmed_total,
            tickets_sold = ledger.tickets_sold,
            "Purchase confirmed"
        );
    }

    /// Authoritative pending total: the fares of every live session that
    /// holds a reservation. The tracked value is overwritten with it and the
    /// resulting totals are returned.
    pub async fn recompute_pending(&self, store: &SessionStore) -> LedgerSnapshot {
        let mut ledger = self.current().await;
        let sessions = store.list().await;
        let pending: Decimal = sessions.iter().filter_map(Session::reserved_amount).sum();

        if ledger.pending_total != pending {
            tracing::debug!(
                tracked = %ledger.pending_total,
                recomputed = %pending,
                "Pending total corrected from live sessions"
            );
        }
        ledger.pending_total = pending;
        ledger.clone()
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.current().await.clone()
    }

    /// Totals with pending recomputed from `store`, plus conversion rate and
    /// average ticket price. Both ratios are zero when their denominator is
    /// zero.
    pub async fn metrics(&self, store: &SessionStore, stats: &StatsSnapshot) -> RevenueMetrics {
        let ledger = self.recompute_pending(store).await;
        let average_ticket_price = ledger
            .total_revenue
            .checked_div(Decimal::from(ledger.tickets_sold))
            .map_or(Decimal::ZERO, |avg| avg.round_dp(2));

        RevenueMetrics {
            confirmed_total: ledger.confirmed_total,
            pending_total: ledger.pending_total,
            total_revenue: ledger.total_revenue,
            revenue_today: ledger.revenue_today,
            tickets_sold: ledger.tickets_sold,
            tickets_today: ledger.tickets_today,
            conversion_rate: stats.success_rate(),
            average_ticket_price,
        }
    }

    /// Lock the totals, resetting the daily ones first if the day changed
    async fn current(&self) -> tokio::sync::MutexGuard<'_, LedgerSnapshot> {
        let today = self.clock.today();
        let mut ledger = self.inner.lock().await;
        if ledger.day != today {
            tracing::info!(
                previous = %ledger.day,
                revenue = %ledger.revenue_today,
                tickets = ledger.tickets_today,
                "Day rolled over, resetting daily revenue"
            );
            ledger.day = today;
            ledger.revenue_today = Decimal::ZERO;
            ledger.tickets_today = 0;
        }
        ledger
    }
}

/// `a - b`, clamped at zero to absorb accounting drift
fn floored_sub(a: Decimal, b: Decimal) -> Decimal {
    (a - b).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::menu::{MenuState, SelectionUpdate};
    use crate::stats::Stats;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn ledger() -> (Arc<ManualClock>, RevenueLedger) {
        let clock = Arc::new(ManualClock::at("2026-10-19T08:00:00Z"));
        let ledger = RevenueLedger::new(clock.clone());
        (clock, ledger)
    }

    fn session(id: &str, state: MenuState, price: Option<Decimal>) -> Session {
        let mut session = Session::new(id, "+27820000001", Utc::now());
        session.state = state;
        if let Some(price) = price {
            session.selection.apply(SelectionUpdate::Price(price));
        }
        session
    }

    async fn store_with(sessions: Vec<Session>) -> SessionStore {
        let store = SessionStore::new();
        for session in sessions {
            store
                .get_or_create(&session.session_id, &session.phone_number, session.started_at)
                .await;
            store.save(session).await;
        }
        store
    }

    #[tokio::test]
    async fn test_confirm_purchase_moves_pending_to_confirmed() {
        let (_, ledger) = ledger();
        ledger.add_pending(dec!(150.00)).await;
        ledger.add_pending(dec!(300.00)).await;

        ledger.confirm_purchase(dec!(150.00)).await;

        let snap = ledger.snapshot().await;
        assert_eq!(snap.pending_total, dec!(300.00));
        assert_eq!(snap.confirmed_total, dec!(150.00));
        assert_eq!(snap.total_revenue, dec!(150.00));
        assert_eq!(snap.revenue_today, dec!(150.00));
        assert_eq!(snap.tickets_sold, 1);
        assert_eq!(snap.tickets_today, 1);
    }

    #[tokio::test]
    async fn test_pending_is_floored_at_zero() {
        let (_, ledger) = ledger();
        ledger.confirm_purchase(dec!(120.00)).await;
        assert_eq!(ledger.snapshot().await.pending_total, Decimal::ZERO);

        ledger.add_pending(dec!(100.00)).await;
        ledger.release_pending(dec!(250.00)).await;
        assert_eq!(ledger.snapshot().await.pending_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_recompute_pending_uses_live_sessions() {
        let (_, ledger) = ledger();
        // Tracked value drifted, e.g. a reserved session was swept
        ledger.add_pending(dec!(999.00)).await;

        let store = store_with(vec![
            session("a", MenuState::ConfirmPayment, Some(dec!(150.00))),
            session("b", MenuState::PaymentProcessing, Some(dec!(300.00))),
            session("c", MenuState::SelectClass, None),
            session("d", MenuState::MainMenu, Some(dec!(500.00))),
        ])
        .await;
        assert_eq!(ledger.recompute_pending(&store).await.pending_total, dec!(450.00));
        assert_eq!(ledger.snapshot().await.pending_total, dec!(450.00));

        store.remove("a").await;
        store.remove("b").await;
        assert_eq!(ledger.recompute_pending(&store).await.pending_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_metrics_with_zero_denominators() {
        let (clock, ledger) = ledger();
        let stats = Stats::new(clock).snapshot().await;
        let metrics = ledger.metrics(&SessionStore::new(), &stats).await;
        assert_eq!(metrics.average_ticket_price, Decimal::ZERO);
        assert!(metrics.conversion_rate.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_metrics_ratios() {
        let (clock, ledger) = ledger();
        let stats = Stats::new(clock);
        for _ in 0..4 {
            stats.session_started(1).await;
        }
        stats.session_succeeded().await;

        ledger.confirm_purchase(dec!(150.00)).await;
        ledger.confirm_purchase(dec!(100.00)).await;
        ledger.confirm_purchase(dec!(100.00)).await;

        let metrics = ledger
            .metrics(&SessionStore::new(), &stats.snapshot().await)
            .await;
        assert_eq!(metrics.average_ticket_price, dec!(116.67));
        assert!((metrics.conversion_rate - 25.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_daily_totals_roll_over() {
        let (clock, ledger) = ledger();
        ledger.confirm_purchase(dec!(150.00)).await;
        clock.advance(chrono::Duration::days(1));
        ledger.confirm_purchase(dec!(120.00)).await;

        let snap = ledger.snapshot().await;
        assert_eq!(snap.revenue_today, dec!(120.00));
        assert_eq!(snap.tickets_today, 1);
        assert_eq!(snap.total_revenue, dec!(270.00));
        assert_eq!(snap.tickets_sold, 2);
    }

    #[tokio::test]
    async fn test_concurrent_confirmations_are_not_lost() {
        let (_, ledger) = ledger();
        let ledger = Arc::new(ledger);
        let mut handles = vec![];
        for _ in 0..100 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.add_pending(dec!(150.00)).await;
                ledger.confirm_purchase(dec!(150.00)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let snap = ledger.snapshot().await;
        assert_eq!(snap.confirmed_total, dec!(15000.00));
        assert_eq!(snap.tickets_sold, 100);
        assert_eq!(snap.pending_total, Decimal::ZERO);
    }
}
