//! Amount extraction from free-text order totals.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex_lite::Regex;
use rust_decimal::Decimal;

static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$?\s*(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)")
        .unwrap_or_else(|e| panic!("invalid amount pattern: {}", e))
});

/// Extract the first currency-like number from a free-text total.
///
/// Accepts forms such as `$1,234.56`, `15.50` and `15`. Returns `None` when
/// nothing numeric is present.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let captures = AMOUNT_PATTERN.captures(text)?;
    let digits = captures.get(1)?.as_str().replace(',', "");
    Decimal::from_str(&digits).ok().map(|d| d.round_dp(2))
}

/// Parse a total, falling back to `fallback` when no amount can be extracted.
pub fn amount_or(text: &str, fallback: Decimal) -> Decimal {
    parse_amount(text).unwrap_or(fallback)
}

/// Render an amount as dollars with two decimals.
pub fn format_amount(amount: Decimal) -> String {
    format!("${:.2}", amount)
}
