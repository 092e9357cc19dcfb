//! Flag token coercion.
//!
//! Every backend stores the maintenance flag as a short text token. The
//! conversion in both directions lives here so all backends agree on what
//! counts as "active".
//!
//! Coercion is total: any token outside the recognized sets (including the
//! empty string) resolves to `false`. A read path must never fail because
//! an operator typed `enabled` instead of `on` - it warns and keeps the
//! service up.

use tracing::warn;

/// Tokens recognized as "maintenance active" (case-insensitive).
pub(crate) const TRUTHY_TOKENS: &[&str] = &["1", "yes", "y", "true", "t", "on"];

/// Tokens recognized as "maintenance inactive" (case-insensitive).
pub(crate) const FALSY_TOKENS: &[&str] = &["0", "no", "n", "false", "f", "off"];

/// Parses a stored flag token into the maintenance state.
///
/// The token is trimmed and lowercased before matching. Returns `true` for
/// `1`, `yes`, `y`, `true`, `t`, `on`; `false` for everything else. A
/// non-empty token outside both recognized sets logs a warning before
/// defaulting to `false`.
///
/// ```
/// use hypnos_core::parse_flag;
///
/// assert!(parse_flag("1"));
/// assert!(parse_flag("  TrUe  "));
/// assert!(!parse_flag("off"));
/// assert!(!parse_flag(""));
/// assert!(!parse_flag("maybe"));
/// ```
#[must_use]
pub fn parse_flag(raw: &str) -> bool {
    let token = raw.trim().to_ascii_lowercase();
    if TRUTHY_TOKENS.contains(&token.as_str()) {
        return true;
    }
    if !token.is_empty() && !FALSY_TOKENS.contains(&token.as_str()) {
        warn!(token = %token, "unrecognized maintenance flag token, defaulting to inactive");
    }
    false
}

/// Formats the maintenance state as the canonical stored token.
///
/// `true` becomes `"1"`, `false` becomes `"0"`. [`parse_flag`] accepts both.
#[must_use]
pub fn format_flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
