//! Screen text for every menu node

use super::pricing::{PriceTable, Route, TravelClass};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt::Write;

const BRAND: &str = "Africa Railways";
const DIAL_CODE: &str = "*123#";

/// Text shown to the caller and whether the session stays open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `CON`: more input expected
    Continue(String),
    /// `END`: the gateway closes the session
    End(String),
}

impl Reply {
    pub fn is_end(&self) -> bool {
        matches!(self, Reply::End(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Reply::Continue(text) | Reply::End(text) => text,
        }
    }

    /// Wire format: protocol marker, a space, then the screen
    pub fn to_wire(&self) -> String {
        match self {
            Reply::Continue(text) => format!("CON {text}"),
            Reply::End(text) => format!("END {text}"),
        }
    }
}

pub fn main_menu() -> Reply {
    Reply::Continue(format!(
        "Welcome to {BRAND}\n1. Buy Ticket\n2. Check Ticket\n3. My Tickets\n4. Help"
    ))
}

pub fn route_menu() -> Reply {
    let mut text = String::from("Select Route:");
    for (i, route) in Route::ALL.iter().enumerate() {
        let _ = write!(text, "\n{}. {}", i + 1, route.label());
    }
    text.push_str("\n0. Back");
    Reply::Continue(text)
}

pub fn date_menu() -> Reply {
    Reply::Continue("Select Date:\n1. Today\n2. Tomorrow\n0. Back".to_string())
}

/// Class list priced for the chosen route
pub fn class_menu(prices: &PriceTable, route: Route) -> Reply {
    let mut text = String::from("Select Class:");
    for (i, class) in TravelClass::ALL.iter().enumerate() {
        let price = prices.lookup(route, *class);
        let _ = write!(text, "\n{}. {} (R{})", i + 1, class.label(), price.normalize());
    }
    text.push_str("\n0. Back");
    Reply::Continue(text)
}

pub fn confirm_menu(
    route: Route,
    date: NaiveDate,
    today: NaiveDate,
    class: TravelClass,
    price: Decimal,
) -> Reply {
    Reply::Continue(format!(
        "Confirm Purchase:\nRoute: {}\nDate: {}\nClass: {}\nPrice: R{price:.2}\n\n\
         1. Pay with M-Pesa\n2. Pay with Card\n0. Cancel",
        route.label(),
        date_label(date, today),
        class.label(),
    ))
}

pub fn payment_initiated(amount: Decimal, wallet: &str) -> Reply {
    Reply::End(format!(
        "Payment initiated!\nAmount: R{amount:.2}\n\
         You will receive an SMS with your ticket details.\n\
         Wallet: 0x{wallet}\nThank you for choosing {BRAND}!"
    ))
}

pub fn ticket_prompt() -> Reply {
    Reply::Continue("Enter your ticket number:".to_string())
}

pub fn ticket_lookup(ticket_number: &str) -> Reply {
    Reply::End(format!(
        "Ticket {ticket_number}:\nStatus check requested.\n\
         You will receive an SMS with the ticket status."
    ))
}

pub fn my_tickets() -> Reply {
    Reply::End(
        "Your Tickets:\n1. JHB-CPT (Today, 14:00)\n2. CPT-JHB (Tomorrow, 09:00)\n\n\
         Tickets are stored in your wallet."
            .to_string(),
    )
}

pub fn help() -> Reply {
    Reply::End(format!(
        "{BRAND} Help:\nCall: 0800 RAILWAY\nWhatsApp: +27 82 123 4567\nEmail: help@africarailways.com"
    ))
}

pub fn invalid_selection() -> Reply {
    Reply::End(format!("Invalid selection.\nPlease dial {DIAL_CODE} to try again."))
}

fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%Y-%m-%d").to_string(),
    }
}
