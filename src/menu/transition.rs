//! Pure menu transition function
//!
//! Given the stored state, the caller's selection so far and the latest
//! keypress, decide the next state, the screen to show and the effects to
//! run. No I/O happens here.

use super::effect::{Effect, PaymentMethod};
use super::input::Input;
use super::pricing::{PriceTable, Route, TravelClass};
use super::render::{self, Reply};
use super::state::{MenuState, Selection, SelectionUpdate};
use chrono::{Days, NaiveDate};
use thiserror::Error;

const MAX_TICKET_NUMBER_LEN: usize = 20;

/// Per-request inputs that are not part of the session
#[derive(Debug, Clone, Copy)]
pub struct MenuContext<'a> {
    pub phone_number: &'a str,
    pub today: NaiveDate,
    /// Wallet reference handed out on a successful purchase
    pub wallet: &'a str,
    pub prices: &'a PriceTable,
}

/// Result of a menu transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: MenuState,
    pub reply: Reply,
    pub updates: Vec<SelectionUpdate>,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: MenuState, reply: Reply) -> Self {
        Self {
            new_state: state,
            reply,
            updates: vec![],
            effects: vec![],
        }
    }

    pub fn with_update(mut self, update: SelectionUpdate) -> Self {
        self.updates.push(update);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }

    /// The session ends with this reply
    pub fn is_terminal(&self) -> bool {
        self.reply.is_end()
    }
}

/// Errors that end the session with "Invalid selection"
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Invalid selection {input:?} at {state}")]
    InvalidSelection { state: MenuState, input: String },
    #[error("Reached {state} without a selected {field}")]
    MissingSelection {
        state: MenuState,
        field: &'static str,
    },
}

impl TransitionError {
    fn invalid(state: MenuState, input: &str) -> Self {
        TransitionError::InvalidSelection {
            state,
            input: input.to_string(),
        }
    }
}

/// Pure transition function
pub fn transition(
    state: MenuState,
    selection: &Selection,
    ctx: &MenuContext<'_>,
    input: &Input,
) -> Result<TransitionResult, TransitionError> {
    let token = match input {
        // Start and Back both reset the flow, dropping any reservation
        Input::Start | Input::Back => {
            return Ok(TransitionResult::new(MenuState::MainMenu, render::main_menu())
                .with_update(SelectionUpdate::Clear)
                .with_effects(release_reservation(state, selection)));
        }
        Input::Choice(token) => token.as_str(),
    };

    match (state, token) {
        // ============================================================
        // Root menu
        // ============================================================
        (MenuState::MainMenu, "1") => Ok(TransitionResult::new(
            MenuState::SelectRoute,
            render::route_menu(),
        )),
        (MenuState::MainMenu, "2") => Ok(TransitionResult::new(
            MenuState::CheckTicket,
            render::ticket_prompt(),
        )),
        (MenuState::MainMenu, "3") => {
            Ok(TransitionResult::new(MenuState::MainMenu, render::my_tickets()))
        }
        (MenuState::MainMenu, "4") => {
            Ok(TransitionResult::new(MenuState::MainMenu, render::help()))
        }

        // ============================================================
        // Purchase flow
        // ============================================================
        (MenuState::SelectRoute, option) => {
            let route =
                Route::from_option(option).ok_or_else(|| TransitionError::invalid(state, option))?;
            Ok(
                TransitionResult::new(MenuState::SelectDate, render::date_menu())
                    .with_update(SelectionUpdate::Route(route)),
            )
        }

        (MenuState::SelectDate, option) => {
            let date = match option {
                "1" => Some(ctx.today),
                "2" => ctx.today.checked_add_days(Days::new(1)),
                _ => None,
            }
            .ok_or_else(|| TransitionError::invalid(state, option))?;
            let route = require(selection.route, state, "route")?;
            Ok(TransitionResult::new(
                MenuState::SelectClass,
                render::class_menu(ctx.prices, route),
            )
            .with_update(SelectionUpdate::Date(date)))
        }

        (MenuState::SelectClass, option) => {
            let class = TravelClass::from_option(option)
                .ok_or_else(|| TransitionError::invalid(state, option))?;
            let route = require(selection.route, state, "route")?;
            let date = require(selection.date, state, "date")?;
            let price = ctx.prices.lookup(route, class);
            Ok(TransitionResult::new(
                MenuState::ConfirmPayment,
                render::confirm_menu(route, date, ctx.today, class, price),
            )
            .with_update(SelectionUpdate::Class(class))
            .with_update(SelectionUpdate::Price(price))
            .with_effect(Effect::ReservePending { amount: price }))
        }

        (MenuState::ConfirmPayment, option) => {
            let method = PaymentMethod::from_option(option)
                .ok_or_else(|| TransitionError::invalid(state, option))?;
            let amount = require(selection.price, state, "price")?;
            let route = require(selection.route, state, "route")?;
            let class = require(selection.class, state, "class")?;
            let date = require(selection.date, state, "date")?;
            Ok(TransitionResult::new(
                MenuState::PaymentProcessing,
                render::payment_initiated(amount, ctx.wallet),
            )
            .with_effect(Effect::ConfirmPurchase { amount })
            .with_effect(Effect::NotifyPurchase {
                phone_number: ctx.phone_number.to_string(),
                route,
                class,
                date,
                amount,
                method,
                wallet: ctx.wallet.to_string(),
            }))
        }

        // ============================================================
        // Ticket status
        // ============================================================
        (MenuState::CheckTicket, ticket) if is_ticket_number(ticket) => Ok(TransitionResult::new(
            MenuState::CheckTicket,
            render::ticket_lookup(ticket),
        )
        .with_effect(Effect::LookupTicket {
            phone_number: ctx.phone_number.to_string(),
            ticket_number: ticket.to_string(),
        })),

        (_, other) => Err(TransitionError::invalid(state, other)),
    }
}

/// Effect undoing the pending reservation held by `state`, if any
fn release_reservation(state: MenuState, selection: &Selection) -> Option<Effect> {
    if !state.holds_reservation() {
        return None;
    }
    selection
        .price
        .map(|amount| Effect::ReleasePending { amount })
}

fn require<T>(value: Option<T>, state: MenuState, field: &'static str) -> Result<T, TransitionError> {
    value.ok_or(TransitionError::MissingSelection { state, field })
}

fn is_ticket_number(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TICKET_NUMBER_LEN
        && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
