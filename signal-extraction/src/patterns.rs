//! Ordered pattern sets for pulling price levels out of model prose.
//!
//! Each field owns a priority-ordered list of expressions: more specific
//! phrasings come first, generic ones last. The first match that survives the
//! plausibility filter wins.

use crate::plausibility::PlausibilityFilter;
use common::round_price;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

lazy_static! {
    static ref ENTRY_PATTERNS: Vec<Regex> = compile(&[
        r"entry.*?(?:level|price|at|around).*?(\d+\.?\d*)",
        r"(?:buy|long|enter).*?(?:at|around|near).*?(\d+\.?\d*)",
        r"target entry.*?(\d+\.?\d*)",
        r"enter.*?(\d+\.?\d*)",
    ]);
    static ref STOP_LOSS_PATTERNS: Vec<Regex> = compile(&[
        r"stop.?loss.*?(\d+\.?\d*)",
        r"\bsl\b.*?(\d+\.?\d*)",
        r"stop.*?(\d+\.?\d*)",
        r"cut losses.*?(\d+\.?\d*)",
    ]);
    static ref TAKE_PROFIT_PATTERNS: Vec<Regex> = compile(&[
        r"take.?profit.*?(\d+\.?\d*)",
        r"\btp\b.*?(\d+\.?\d*)",
        r"target.*?(\d+\.?\d*)",
        r"profit.*?(?:at|around).*?(\d+\.?\d*)",
    ]);
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("price pattern must compile"))
        .collect()
}

/// Price level a pattern set targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Entry,
    StopLoss,
    TakeProfit,
}

impl PriceField {
    /// Patterns for this field, highest priority first
    pub fn patterns(self) -> &'static [Regex] {
        match self {
            PriceField::Entry => ENTRY_PATTERNS.as_slice(),
            PriceField::StopLoss => STOP_LOSS_PATTERNS.as_slice(),
            PriceField::TakeProfit => TAKE_PROFIT_PATTERNS.as_slice(),
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriceField::Entry => "entry",
            PriceField::StopLoss => "stop_loss",
            PriceField::TakeProfit => "take_profit",
        };
        f.write_str(s)
    }
}

/// Lower-case and strip currency symbols and thousands separators
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().replace([',', '$'], "")
}

/// Parse a captured number, tolerating a dangling decimal point ("97.")
pub(crate) fn parse_number(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim().trim_end_matches('.')).ok()
}

/// Scans normalized text for price levels
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    filter: PlausibilityFilter,
}

impl PatternMatcher {
    pub fn new(filter: PlausibilityFilter) -> Self {
        Self { filter }
    }

    /// First plausible value for `field`, or `None` when nothing qualifies.
    ///
    /// `text` must already be normalized with [`normalize_text`].
    pub fn find(&self, text: &str, field: PriceField, reference: Decimal) -> Option<Decimal> {
        for (rank, pattern) in field.patterns().iter().enumerate() {
            for captures in pattern.captures_iter(text) {
                let Some(raw) = captures.get(1) else {
                    continue;
                };
                let Some(candidate) = parse_number(raw.as_str()) else {
                    continue;
                };

                if self.filter.accept(candidate, reference) {
                    debug!("{} matched pattern #{}: {}", field, rank, candidate);
                    return Some(round_price(candidate));
                }
                debug!(
                    "{} candidate {} outside plausible range for reference {}",
                    field, candidate, reference
                );
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn find(text: &str, field: PriceField, reference: Decimal) -> Option<Decimal> {
        PatternMatcher::default().find(&normalize_text(text), field, reference)
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("Entry AT $51,250.5"), "entry at 51250.5");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("97."), Some(dec!(97)));
        assert_eq!(parse_number("51250.75"), Some(dec!(51250.75)));
        assert_eq!(parse_number("."), None);
    }

    #[test]
    fn test_basic_fields() {
        let text = "Entry around $100, stop loss $97, take profit $103";
        assert_eq!(find(text, PriceField::Entry, dec!(100)), Some(dec!(100)));
        assert_eq!(find(text, PriceField::StopLoss, dec!(100)), Some(dec!(97)));
        assert_eq!(find(text, PriceField::TakeProfit, dec!(100)), Some(dec!(103)));
    }

    #[test]
    fn test_skips_implausible_match_and_keeps_scanning() {
        // The year is rejected; the next match of the same pattern is taken
        let text = "Entry price for 2024 cycle: entry at $50,400";
        assert_eq!(find(text, PriceField::Entry, dec!(50000)), Some(dec!(50400)));
    }

    #[test]
    fn test_falls_through_to_lower_priority_pattern() {
        let text = "I would enter 49,800 on a dip";
        assert_eq!(find(text, PriceField::Entry, dec!(50000)), Some(dec!(49800)));

        let text = "cut losses below 48000";
        assert_eq!(find(text, PriceField::StopLoss, dec!(50000)), Some(dec!(48000)));

        let text = "price target 53,000";
        assert_eq!(find(text, PriceField::TakeProfit, dec!(50000)), Some(dec!(53000)));
    }

    #[test]
    fn test_short_tokens_need_word_boundaries() {
        // "slightly" must not be read as an SL marker
        let text = "slightly bullish near 50100";
        assert_eq!(find(text, PriceField::StopLoss, dec!(50000)), None);

        let text = "SL: 48,900 TP: 52,100";
        assert_eq!(find(text, PriceField::StopLoss, dec!(50000)), Some(dec!(48900)));
        assert_eq!(find(text, PriceField::TakeProfit, dec!(50000)), Some(dec!(52100)));
    }

    #[test]
    fn test_rounds_to_cents() {
        let text = "entry at 100.456";
        assert_eq!(find(text, PriceField::Entry, dec!(100)), Some(dec!(100.46)));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(find("markets are choppy", PriceField::Entry, dec!(100)), None);
        assert_eq!(find("entry at $999999", PriceField::Entry, dec!(100)), None);
    }
}
