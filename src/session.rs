//! USSD sessions
//!
//! A session is one caller's walk through the menu, keyed by the
//! gateway-supplied session id.

mod store;
mod sweeper;

pub use store::SessionStore;
pub use sweeper::spawn_sweeper;

use crate::menu::{MenuState, Selection};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One caller's progress through the menu tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub phone_number: String,
    pub state: MenuState,
    /// Full accumulated input of the latest request
    pub last_command: String,
    pub started_at: DateTime<Utc>,
    pub selection: Selection,
}

impl Session {
    pub fn new(
        session_id: impl Into<String>,
        phone_number: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            phone_number: phone_number.into(),
            state: MenuState::MainMenu,
            last_command: String::new(),
            started_at,
            selection: Selection::default(),
        }
    }

    /// Fare counted as pending revenue while this session is live
    pub fn reserved_amount(&self) -> Option<Decimal> {
        if self.state.holds_reservation() {
            self.selection.price
        } else {
            None
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.started_at
    }
}
