//! Menu states and the selection a caller accumulates along the way

use super::pricing::{Route, TravelClass};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Menu node a caller is currently at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MenuState {
    /// Root menu, also where every new session starts
    #[default]
    MainMenu,
    SelectRoute,
    SelectDate,
    SelectClass,
    /// Price is fixed and reserved as pending revenue
    ConfirmPayment,
    /// Payment accepted, session is about to end
    PaymentProcessing,
    /// Waiting for a ticket number
    CheckTicket,
}

impl MenuState {
    pub fn as_str(self) -> &'static str {
        match self {
            MenuState::MainMenu => "main_menu",
            MenuState::SelectRoute => "select_route",
            MenuState::SelectDate => "select_date",
            MenuState::SelectClass => "select_class",
            MenuState::ConfirmPayment => "confirm_payment",
            MenuState::PaymentProcessing => "payment_processing",
            MenuState::CheckTicket => "check_ticket",
        }
    }

    /// States whose selected price counts towards pending revenue
    pub fn holds_reservation(self) -> bool {
        matches!(self, MenuState::ConfirmPayment | MenuState::PaymentProcessing)
    }
}

impl fmt::Display for MenuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Choices made so far in the purchase flow
///
/// Each field is written by exactly one transition and is never overwritten
/// until the flow returns to the main menu.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<TravelClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

/// A single change to a [`Selection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionUpdate {
    Clear,
    Route(Route),
    Date(NaiveDate),
    Class(TravelClass),
    Price(Decimal),
}

impl Selection {
    /// Apply an update. Returns `false` if the field was already set, in
    /// which case the existing value is kept.
    pub fn apply(&mut self, update: SelectionUpdate) -> bool {
        fn set_once<T>(slot: &mut Option<T>, value: T) -> bool {
            if slot.is_some() {
                return false;
            }
            *slot = Some(value);
            true
        }

        match update {
            SelectionUpdate::Clear => {
                *self = Self::default();
                true
            }
            SelectionUpdate::Route(route) => set_once(&mut self.route, route),
            SelectionUpdate::Date(date) => set_once(&mut self.date, date),
            SelectionUpdate::Class(class) => set_once(&mut self.class, class),
            SelectionUpdate::Price(price) => set_once(&mut self.price, price),
        }
    }
}
