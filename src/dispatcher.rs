//! USSD request dispatcher
//!
//! Runs one gateway request through the session store, the menu state
//! machine and the ledger, then hands back the screen to show.

use crate::clock::Clock;
use crate::ledger::{RevenueLedger, RevenueMetrics};
use crate::menu::input::tokens;
use crate::menu::{
    render, transition, Effect, Input, MenuContext, MenuState, PriceTable, Reply, TransitionResult,
};
use crate::notify::Notification;
use crate::session::{Session, SessionStore};
use crate::stats::Stats;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, error::TrySendError};

/// One inbound gateway request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UssdRequest {
    pub session_id: String,
    pub phone_number: String,
    /// Accumulated `*`-joined input
    pub text: String,
    pub service_code: Option<String>,
}

impl UssdRequest {
    pub fn new(
        session_id: impl Into<String>,
        phone_number: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            phone_number: phone_number.into(),
            text: text.into(),
            service_code: None,
        }
    }
}

/// Shared request handler. Owns the store, ledger and counters.
pub struct Dispatcher {
    store: SessionStore,
    ledger: RevenueLedger,
    stats: Stats,
    prices: PriceTable,
    clock: Arc<dyn Clock>,
    notify_tx: mpsc::Sender<Notification>,
}

impl Dispatcher {
    pub fn new(
        clock: Arc<dyn Clock>,
        prices: PriceTable,
        notify_tx: mpsc::Sender<Notification>,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            ledger: RevenueLedger::new(clock.clone()),
            stats: Stats::new(clock.clone()),
            prices,
            clock,
            notify_tx,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn ledger(&self) -> &RevenueLedger {
        &self.ledger
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Handle a gateway request and return the reply to send back
    pub async fn handle(&self, request: &UssdRequest) -> Reply {
        let started = Instant::now();
        tracing::info!(
            session_id = %request.session_id,
            phone = %request.phone_number,
            text = %request.text,
            service_code = request.service_code.as_deref().unwrap_or_default(),
            depth = tokens(&request.text).count(),
            "USSD request"
        );

        let reply = self.dispatch(request).await;

        let elapsed = started.elapsed();
        self.stats.record_request(elapsed).await;
        tracing::info!(
            session_id = %request.session_id,
            end = reply.is_end(),
            elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
            "USSD response sent"
        );
        reply
    }

    async fn dispatch(&self, request: &UssdRequest) -> Reply {
        let input = Input::from_path(&request.text);

        let session = if input == Input::Start {
            let (session, created) = self
                .store
                .get_or_create(&request.session_id, &request.phone_number, self.clock.now())
                .await;
            if created {
                self.stats.session_started(self.store.len().await).await;
            }
            session
        } else if let Some(session) = self.store.get(&request.session_id).await {
            session
        } else {
            // Expired, finished, or a retry of a request that already ended
            // the session. Never re-run its effects.
            tracing::warn!(
                session_id = %request.session_id,
                text = %request.text,
                "Input for unknown session"
            );
            self.stats.session_failed().await;
            return render::invalid_selection();
        };

        // Only a confirmed payment hands out a wallet reference
        let wallet = if session.state == MenuState::ConfirmPayment {
            mock_wallet()
        } else {
            String::new()
        };
        let ctx = MenuContext {
            phone_number: &session.phone_number,
            today: self.clock.today(),
            wallet: &wallet,
            prices: &self.prices,
        };

        match transition(session.state, &session.selection, &ctx, &input) {
            Ok(result) => self.apply(session, &request.text, result).await,
            Err(e) => {
                tracing::warn!(
                    session_id = %session.session_id,
                    state = %session.state,
                    error = %e,
                    "Ending session"
                );
                self.abandon(&session).await;
                self.stats.session_failed().await;
                render::invalid_selection()
            }
        }
    }

    async fn apply(&self, mut session: Session, text: &str, result: TransitionResult) -> Reply {
        let terminal = result.is_terminal();
        let TransitionResult {
            new_state,
            reply,
            updates,
            effects,
        } = result;

        for update in updates {
            if !session.selection.apply(update) {
                tracing::warn!(
                    session_id = %session.session_id,
                    update = ?update,
                    "Selection already set, keeping existing value"
                );
            }
        }
        tracing::debug!(
            session_id = %session.session_id,
            from = %session.state,
            to = %new_state,
            ledger_effects = effects.iter().filter(|e| e.is_ledger()).count(),
            "Menu transition"
        );
        session.state = new_state;
        session.last_command = text.to_string();

        // Store first: a confirmed fare must be out of the pending sessions
        // before it reaches the ledger.
        if terminal {
            self.store.remove(&session.session_id).await;
        } else if !self.store.save(session).await {
            tracing::info!(text = %text, "Session expired mid-request, not restoring it");
        }

        for effect in effects {
            self.execute_effect(effect).await;
        }
        reply
    }

    async fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::ReservePending { amount } => self.ledger.add_pending(amount).await,
            Effect::ReleasePending { amount } => self.ledger.release_pending(amount).await,
            Effect::ConfirmPurchase { amount } => {
                self.ledger.confirm_purchase(amount).await;
                self.stats.session_succeeded().await;
            }
            Effect::NotifyPurchase {
                phone_number,
                route,
                class,
                date,
                amount,
                method,
                wallet,
            } => self.enqueue(Notification::Purchase {
                phone_number,
                route,
                class,
                date,
                amount,
                method,
                wallet,
            }),
            Effect::LookupTicket {
                phone_number,
                ticket_number,
            } => self.enqueue(Notification::TicketLookup {
                phone_number,
                ticket_number,
            }),
        }
    }

    /// Remove a session that ended without completing, dropping its reservation
    async fn abandon(&self, session: &Session) {
        if let Some(amount) = session.reserved_amount() {
            self.ledger.release_pending(amount).await;
        }
        self.store.remove(&session.session_id).await;
    }

    fn enqueue(&self, notification: Notification) {
        match self.notify_tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => tracing::warn!(
                kind = n.kind(),
                phone = %n.phone_number(),
                "Notification queue full, dropping notification"
            ),
            Err(TrySendError::Closed(n)) => tracing::error!(
                kind = n.kind(),
                phone = %n.phone_number(),
                "Notification worker gone, dropping notification"
            ),
        }
    }

    /// Revenue metrics with pending recomputed from the live sessions
    pub async fn revenue(&self) -> RevenueMetrics {
        let stats = self.stats.snapshot().await;
        self.ledger.metrics(&self.store, &stats).await
    }
}

/// Placeholder wallet address until minting is wired up
fn mock_wallet() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
