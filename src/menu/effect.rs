//! Effects produced by menu transitions
//!
//! The state machine never touches the ledger or the outside world; it
//! describes what should happen and the dispatcher carries it out.

use super::pricing::{Route, TravelClass};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the caller chose to pay on the confirmation screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    MPesa,
    Card,
}

impl PaymentMethod {
    pub fn from_option(option: &str) -> Option<Self> {
        match option {
            "1" => Some(PaymentMethod::MPesa),
            "2" => Some(PaymentMethod::Card),
            _ => None,
        }
    }
}

/// Effects to be executed after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// A fare was fixed on the confirmation screen
    ReservePending { amount: Decimal },

    /// The caller left the confirmation screen without paying
    ReleasePending { amount: Decimal },

    /// Move a reserved fare into confirmed revenue
    ConfirmPurchase { amount: Decimal },

    /// Tell the caller about their ticket (SMS collaborator)
    NotifyPurchase {
        phone_number: String,
        route: Route,
        class: TravelClass,
        date: NaiveDate,
        amount: Decimal,
        method: PaymentMethod,
        wallet: String,
    },

    /// Look up a ticket and report its status to the caller
    LookupTicket {
        phone_number: String,
        ticket_number: String,
    },
}

impl Effect {
    /// Whether the effect changes ledger totals
    pub fn is_ledger(&self) -> bool {
        matches!(
            self,
            Effect::ReservePending { .. }
                | Effect::ReleasePending { .. }
                | Effect::ConfirmPurchase { .. }
        )
    }
}
