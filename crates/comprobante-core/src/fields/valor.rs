//! Monetary-value resolution and locale normalization.
//!
//! Colombian documents mix two conventions: `16.220.167,00` (periods
//! group, comma marks decimals) and `4,688.07` (the reverse). The
//! ambiguity has to be settled from the separator counts before any
//! character is stripped; afterwards everything collapses to a canonical
//! `integer.XX` string.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::trace;

use super::patterns::VALOR_CASCADE;

/// Minimum digit count for a value candidate. Filters incidental small
/// numbers out of the totals zone.
const MIN_VALUE_DIGITS: usize = 6;

/// Scan OCR text for a monetary value, returning the canonical
/// `integer.XX` form of the first acceptable match.
pub fn find_valor(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    for (rank, pattern) in VALOR_CASCADE.iter().enumerate() {
        for caps in pattern.captures_iter(&collapsed) {
            let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let digits = raw.chars().filter(|c| c.is_ascii_digit()).count();
            if digits < MIN_VALUE_DIGITS {
                continue;
            }
            if let Some(canonical) = normalize(raw) {
                trace!(rank, raw, %canonical, "valor pattern matched");
                return Some(canonical);
            }
        }
    }
    None
}

/// Normalize a raw matched amount into `integer.XX`.
pub fn normalize(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let commas = compact.matches(',').count();
    let periods = compact.matches('.').count();

    let disambiguated = if commas == 1 && periods > 1 {
        // Periods group thousands, the comma marks decimals.
        compact.replace('.', "").replace(',', ".")
    } else if periods == 1 && commas >= 1 {
        // Commas group thousands.
        compact.replace(',', "")
    } else {
        compact
    };

    let cleaned: String = disambiguated
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    // The last period separates the fraction; earlier ones are grouping.
    let (integer, fraction) = match cleaned.rfind('.') {
        Some(pos) => (cleaned[..pos].replace('.', ""), cleaned[pos + 1..].to_string()),
        None => (cleaned, String::new()),
    };
    let integer = if integer.is_empty() {
        "0".to_string()
    } else {
        integer
    };
    let padded = format!("{fraction:0<2}");
    Some(format!("{integer}.{}", &padded[..2]))
}

/// Parse the canonical form for the result record.
pub fn to_decimal(canonical: &str) -> Option<Decimal> {
    Decimal::from_str(canonical).ok()
}
