use crate::config::PlausibilityConfig;
use rust_decimal::Decimal;

/// Accepts candidate prices that sit inside a band around the reference price.
///
/// Free-form text is full of numbers that are not prices (dates, percentages,
/// unit slips); anything outside the band is discarded, never clamped.
#[derive(Debug, Clone)]
pub struct PlausibilityFilter {
    band: Decimal,
}

impl PlausibilityFilter {
    pub fn new(config: &PlausibilityConfig) -> Self {
        Self { band: config.band }
    }

    /// Inclusive (lower, upper) bounds for a reference price, `None` on overflow
    pub fn bounds(&self, reference: Decimal) -> Option<(Decimal, Decimal)> {
        Some((
            reference.checked_mul(Decimal::ONE - self.band)?,
            reference.checked_mul(Decimal::ONE + self.band)?,
        ))
    }

    pub fn accept(&self, candidate: Decimal, reference: Decimal) -> bool {
        match self.bounds(reference) {
            Some((lower, upper)) => lower <= candidate && candidate <= upper,
            None => false,
        }
    }
}

impl Default for PlausibilityFilter {
    fn default() -> Self {
        Self::new(&PlausibilityConfig::default())
    }
}
