// Signal Validator
// Enforces directional ordering and confidence bounds before a signal is emitted

use crate::config::ValidationConfig;
use common::{round_confidence, round_price, Direction};
use rust_decimal::Decimal;
use tracing::debug;

/// Price levels and confidence after validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLevels {
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub confidence: f64,
    pub direction: Direction,
    pub valid: bool,
}

/// Fills missing or inconsistent levels with default offsets from the entry.
///
/// Applying the validator to its own output with the same reference price
/// returns the same levels.
#[derive(Debug, Clone)]
pub struct SignalValidator {
    config: ValidationConfig,
}

impl SignalValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Long when entry <= reference * long_threshold, short otherwise
    pub fn classify(&self, entry: Decimal, reference: Decimal) -> Direction {
        if entry <= reference * self.config.long_threshold {
            Direction::Long
        } else {
            Direction::Short
        }
    }

    /// Confidence if it lies inside the configured bounds, else the default
    pub fn normalize_confidence(&self, confidence: Option<f64>) -> f64 {
        let bounds = self.config.min_confidence..=self.config.max_confidence;
        match confidence {
            Some(c) if bounds.contains(&c) => c,
            other => {
                debug!("Confidence {:?} replaced by default {}", other, self.config.default_confidence);
                self.config.default_confidence
            }
        }
    }

    pub fn validate(
        &self,
        entry: Option<Decimal>,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
        confidence: Option<f64>,
        reference: Decimal,
    ) -> ValidatedLevels {
        let entry = round_price(entry.unwrap_or_else(|| {
            debug!("No entry extracted, defaulting from reference {}", reference);
            reference * self.config.default_entry_factor
        }));

        let direction = self.classify(entry, reference);
        self.validate_directed(direction, entry, stop_loss, take_profit, confidence)
    }

    /// Validate levels whose direction is already known.
    ///
    /// Levels are rounded to cents first. Stop and target are kept only when
    /// they sit strictly on the correct side of the rounded entry; otherwise
    /// the default offset is used, pushed one cent past the entry if it rounds
    /// onto it.
    pub fn validate_directed(
        &self,
        direction: Direction,
        entry: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
        confidence: Option<f64>,
    ) -> ValidatedLevels {
        let entry = round_price(entry);
        let stop_loss = stop_loss.map(round_price);
        let take_profit = take_profit.map(round_price);
        let lower = |offset: Decimal| below(entry, round_price(entry * (Decimal::ONE - offset)));
        let upper = |offset: Decimal| above(entry, round_price(entry * (Decimal::ONE + offset)));

        let (stop_loss, take_profit) = match direction {
            Direction::Long => {
                let stop = match stop_loss {
                    Some(s) if s < entry => s,
                    _ => lower(self.config.stop_offset),
                };
                let target = match take_profit {
                    Some(t) if t > entry => t,
                    _ => upper(self.config.take_profit_offset),
                };
                (stop, target)
            }
            Direction::Short => {
                let stop = match stop_loss {
                    Some(s) if s > entry => s,
                    _ => upper(self.config.stop_offset),
                };
                let target = match take_profit {
                    Some(t) if t < entry => t,
                    _ => lower(self.config.take_profit_offset),
                };
                (stop, target)
            }
        };

        let confidence = self.normalize_confidence(confidence);

        debug!(
            "Validated {:?}: entry={} sl={} tp={} conf={}",
            direction, entry, stop_loss, take_profit, confidence
        );

        ValidatedLevels {
            entry,
            stop_loss,
            take_profit,
            confidence: round_confidence(confidence),
            direction,
            valid: true,
        }
    }
}

const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// `level` if it is strictly below `entry`, else one cent under the entry
pub(crate) fn below(entry: Decimal, level: Decimal) -> Decimal {
    if level < entry {
        level
    } else {
        entry - CENT
    }
}

/// `level` if it is strictly above `entry`, else one cent over the entry
pub(crate) fn above(entry: Decimal, level: Decimal) -> Decimal {
    if level > entry {
        level
    } else {
        entry.saturating_add(CENT)
    }
}

impl Default for SignalValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
