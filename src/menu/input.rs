//! Parsing of the accumulated USSD input path
//!
//! Gateways send the whole path typed so far (`1*1*2`), not just the
//! latest keypress. The menu steps on the last token only.

/// Separator between tokens in the accumulated path
pub const TOKEN_SEPARATOR: char = '*';

/// A path ending in this digit always leads back to the root menu
pub const BACK_KEY: char = '0';

/// The caller's latest keypress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Empty path: the session was just dialled
    Start,
    /// Path ending in `0`: back to the root menu
    Back,
    /// Any other token, matched against the current menu
    Choice(String),
}

impl Input {
    /// Parse an accumulated path. Any path ending in `0` is Back, even
    /// when the `0` closes a longer token such as `10`.
    pub fn from_path(path: &str) -> Self {
        let path = path.trim();
        if path.is_empty() {
            Input::Start
        } else if path.ends_with(BACK_KEY) {
            Input::Back
        } else {
            Input::Choice(last_token(path).to_string())
        }
    }
}

/// Last `*`-separated token, trimmed
pub fn last_token(path: &str) -> &str {
    path.rsplit(TOKEN_SEPARATOR).next().unwrap_or_default().trim()
}

/// Split an accumulated path into its tokens
pub fn tokens(path: &str) -> impl Iterator<Item = &str> {
    let path = path.trim();
    path.split(TOKEN_SEPARATOR)
        .map(str::trim)
        .take_while(move |_| !path.is_empty())
}
