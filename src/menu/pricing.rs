//! Routes, travel classes and the fare table

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Fare charged when a route/class pair is missing from the table
pub const DEFAULT_PRICE: Decimal = dec!(150.00);

/// Routes offered in the "Buy Ticket" menu, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Route {
    #[serde(rename = "JHB-CPT")]
    JhbCpt,
    #[serde(rename = "JHB-DBN")]
    JhbDbn,
    #[serde(rename = "CPT-PE")]
    CptPe,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::JhbCpt, Route::JhbDbn, Route::CptPe];

    /// Menu option ("1", "2", ...) to route
    pub fn from_option(option: &str) -> Option<Self> {
        match option {
            "1" => Some(Route::JhbCpt),
            "2" => Some(Route::JhbDbn),
            "3" => Some(Route::CptPe),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Route::JhbCpt => "JHB-CPT",
            Route::JhbDbn => "JHB-DBN",
            Route::CptPe => "CPT-PE",
        }
    }

    pub fn origin(self) -> &'static str {
        match self {
            Route::JhbCpt | Route::JhbDbn => "Johannesburg",
            Route::CptPe => "Cape Town",
        }
    }

    pub fn destination(self) -> &'static str {
        match self {
            Route::JhbCpt => "Cape Town",
            Route::JhbDbn => "Durban",
            Route::CptPe => "Port Elizabeth",
        }
    }

    pub fn label(self) -> String {
        format!("{} - {}", self.origin(), self.destination())
    }
}

/// Seating class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TravelClass {
    Economy,
    Business,
    FirstClass,
}

impl TravelClass {
    pub const ALL: [TravelClass; 3] = [
        TravelClass::Economy,
        TravelClass::Business,
        TravelClass::FirstClass,
    ];

    pub fn from_option(option: &str) -> Option<Self> {
        match option {
            "1" => Some(TravelClass::Economy),
            "2" => Some(TravelClass::Business),
            "3" => Some(TravelClass::FirstClass),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            TravelClass::Economy => "Economy",
            TravelClass::Business => "Business",
            TravelClass::FirstClass => "FirstClass",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TravelClass::Economy => "Economy",
            TravelClass::Business => "Business",
            TravelClass::FirstClass => "First Class",
        }
    }
}

/// Fares keyed by route and class
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    fares: HashMap<(Route, TravelClass), Decimal>,
}

impl PriceTable {
    /// The published fares, in rand
    pub fn standard() -> Self {
        let fares = [
            (Route::JhbCpt, [dec!(150.00), dec!(300.00), dec!(500.00)]),
            (Route::JhbDbn, [dec!(120.00), dec!(240.00), dec!(400.00)]),
            (Route::CptPe, [dec!(100.00), dec!(200.00), dec!(350.00)]),
        ]
        .into_iter()
        .flat_map(|(route, prices)| {
            TravelClass::ALL
                .into_iter()
                .zip(prices)
                .map(move |(class, price)| ((route, class), price))
        })
        .collect();
        Self { fares }
    }

    #[cfg(test)]
    pub fn with_fare(mut self, route: Route, class: TravelClass, price: Decimal) -> Self {
        self.fares.insert((route, class), price);
        self
    }

    /// Fare for a route/class pair. Missing pairs fall back to
    /// [`DEFAULT_PRICE`] instead of failing the purchase.
    pub fn lookup(&self, route: Route, class: TravelClass) -> Decimal {
        match self.fares.get(&(route, class)) {
            Some(price) => *price,
            None => {
                tracing::warn!(
                    route = route.code(),
                    class = class.key(),
                    default = %DEFAULT_PRICE,
                    "No fare configured, using default price"
                );
                DEFAULT_PRICE
            }
        }
    }

    /// Nested `route -> class -> price` view for reporting
    pub fn by_route(&self) -> BTreeMap<&'static str, BTreeMap<&'static str, Decimal>> {
        let mut view: BTreeMap<_, BTreeMap<_, _>> = BTreeMap::new();
        for ((route, class), price) in &self.fares {
            view.entry(route.code())
                .or_default()
                .insert(class.key(), *price);
        }
        view
    }
}
