//! Property-based tests for the menu state machine

use super::input::tokens;
use super::*;
use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Test Helpers
// ============================================================================

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn test_context(prices: &PriceTable) -> MenuContext<'_> {
    MenuContext {
        phone_number: "+27820000002",
        today: today(),
        wallet: "cafe",
        prices,
    }
}

/// Replay an accumulated path from a fresh session, one token per request.
/// Returns the state reached and whether the session ended.
fn replay(path: &str, prices: &PriceTable) -> (MenuState, Selection, bool) {
    let ctx = test_context(prices);
    let mut state = MenuState::MainMenu;
    let mut selection = Selection::default();

    // Requests carry the growing path: "", "1", "1*1", ...
    let mut typed = String::new();
    let mut requests = vec![String::new()];
    for token in tokens(path) {
        if !typed.is_empty() {
            typed.push('*');
        }
        typed.push_str(token);
        requests.push(typed.clone());
    }

    for request in requests {
        match transition(state, &selection, &ctx, &Input::from_path(&request)) {
            Ok(result) => {
                for update in result.updates {
                    selection.apply(update);
                }
                state = result.new_state;
                if result.reply.is_end() {
                    return (state, selection, true);
                }
            }
            Err(_) => return (state, selection, true),
        }
    }
    (state, selection, false)
}

/// Expected node for a valid path, read straight off the menu tree
fn expected_state(path: &[&str]) -> MenuState {
    match path {
        [] => MenuState::MainMenu,
        ["1"] => MenuState::SelectRoute,
        ["2"] => MenuState::CheckTicket,
        ["1", _] => MenuState::SelectDate,
        ["1", _, _] => MenuState::SelectClass,
        ["1", _, _, _] => MenuState::ConfirmPayment,
        _ => unreachable!("not a continuing path: {path:?}"),
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Valid continuing paths of depth <= 4 from the root menu
fn arb_valid_path() -> impl Strategy<Value = Vec<&'static str>> {
    let route = prop_oneof![Just("1"), Just("2"), Just("3")];
    let date = prop_oneof![Just("1"), Just("2")];
    let class = prop_oneof![Just("1"), Just("2"), Just("3")];
    (0usize..=4, route, date, class).prop_map(|(depth, route, date, class)| {
        if depth == 0 {
            return vec![];
        }
        let full = ["1", route, date, class];
        full[..depth].to_vec()
    })
}

fn arb_token() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[0-4]".prop_map(String::from),
        1 => "[5-9]".prop_map(String::from),
        1 => "[A-Z0-9-]{1,6}",
        1 => Just(String::new()),
    ]
}

fn arb_state() -> impl Strategy<Value = MenuState> {
    prop_oneof![
        Just(MenuState::MainMenu),
        Just(MenuState::SelectRoute),
        Just(MenuState::SelectDate),
        Just(MenuState::SelectClass),
        Just(MenuState::ConfirmPayment),
        Just(MenuState::PaymentProcessing),
        Just(MenuState::CheckTicket),
    ]
}

fn arb_selection() -> impl Strategy<Value = Selection> {
    (
        proptest::option::of(prop_oneof![Just(Route::JhbCpt), Just(Route::JhbDbn), Just(Route::CptPe)]),
        proptest::option::of(Just(today())),
        proptest::option::of(prop_oneof![
            Just(TravelClass::Economy),
            Just(TravelClass::Business),
            Just(TravelClass::FirstClass)
        ]),
        proptest::option::of((1u32..1000).prop_map(Decimal::from)),
    )
        .prop_map(|(route, date, class, price)| Selection {
            route,
            date,
            class,
            price,
        })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Replaying a valid path lands on the node the menu tree names
    #[test]
    fn prop_path_replay_consistency(path in arb_valid_path()) {
        let prices = PriceTable::standard();
        let (state, _, ended) = replay(&path.join("*"), &prices);
        prop_assert!(!ended, "valid path {:?} ended the session", path);
        prop_assert_eq!(state, expected_state(&path));
    }

    // A reservation-holding state always carries a price
    #[test]
    fn prop_reservation_states_have_price(path in proptest::collection::vec(arb_token(), 0..6)) {
        let prices = PriceTable::standard();
        let (state, selection, ended) = replay(&path.join("*"), &prices);
        if !ended && state.holds_reservation() {
            prop_assert!(selection.price.is_some());
        }
    }

    // Back always returns to the root menu with a cleared selection
    #[test]
    fn prop_back_always_resets(state in arb_state(), selection in arb_selection()) {
        let prices = PriceTable::standard();
        let result = transition(state, &selection, &test_context(&prices), &Input::Back).unwrap();
        prop_assert_eq!(result.new_state, MenuState::MainMenu);
        prop_assert_eq!(result.updates, vec![SelectionUpdate::Clear]);
        prop_assert!(!result.reply.is_end());
    }

    // Ledger effects match the state they lead to
    #[test]
    fn prop_effects_match_state(
        state in arb_state(),
        selection in arb_selection(),
        token in arb_token(),
    ) {
        let prices = PriceTable::standard();
        let Ok(result) = transition(state, &selection, &test_context(&prices), &Input::Choice(token)) else {
            return Ok(());
        };
        for effect in &result.effects {
            match effect {
                Effect::ReservePending { .. } => {
                    prop_assert_eq!(result.new_state, MenuState::ConfirmPayment);
                }
                Effect::ConfirmPurchase { amount } => {
                    prop_assert!(result.reply.is_end());
                    prop_assert_eq!(Some(*amount), selection.price);
                }
                Effect::ReleasePending { .. } => {
                    prop_assert_eq!(result.new_state, MenuState::MainMenu);
                }
                Effect::NotifyPurchase { .. } | Effect::LookupTicket { .. } => {
                    prop_assert!(result.reply.is_end());
                }
            }
        }
    }

    // At most one purchase per session, however the caller types
    #[test]
    fn prop_single_purchase_per_flow(path in proptest::collection::vec(arb_token(), 0..8)) {
        let prices = PriceTable::standard();
        let ctx = test_context(&prices);
        let mut state = MenuState::MainMenu;
        let mut selection = Selection::default();
        let mut purchases = 0;
        let mut typed: Vec<String> = vec![];

        for token in path {
            typed.push(token);
            let Ok(result) = transition(state, &selection, &ctx, &Input::from_path(&typed.join("*"))) else {
                break;
            };
            purchases += result
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::ConfirmPurchase { .. }))
                .count();
            for update in result.updates {
                selection.apply(update);
            }
            state = result.new_state;
            if result.reply.is_end() {
                break;
            }
        }
        prop_assert!(purchases <= 1);
    }
}
