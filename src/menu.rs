//! USSD menu state machine
//!
//! Pure transitions keyed by the stored menu state and the caller's latest
//! keypress. Effects are returned, never executed here.

mod effect;
pub mod input;
pub mod pricing;
pub mod render;
mod state;
mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, PaymentMethod};
pub use input::Input;
pub use pricing::{PriceTable, Route, TravelClass};
pub use render::Reply;
pub use state::{MenuState, Selection};
pub use transition::{transition, MenuContext, TransitionResult};

#[cfg(test)]
pub use state::SelectionUpdate;
