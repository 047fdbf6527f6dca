use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which source produced a signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SignalMethod {
    /// Extracted from generative-model prose
    #[serde(rename = "ai")]
    Text,
    /// Adapted from the deterministic calculation engine
    #[serde(rename = "calculation")]
    Calculation,
}

impl SignalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalMethod::Text => "ai",
            SignalMethod::Calculation => "calculation",
        }
    }
}

impl fmt::Display for SignalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market bias reported by the calculation engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketBias {
    Bullish,
    Bearish,
    Neutral,
}

impl fmt::Display for MarketBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketBias::Bullish => "BULLISH",
            MarketBias::Bearish => "BEARISH",
            MarketBias::Neutral => "NEUTRAL",
        };
        f.write_str(s)
    }
}

/// Trade direction implied by a signal's price levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

/// Normalized trading signal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub method: SignalMethod,
    pub entry_level: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub confidence: f64, // 0.0 to 100.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_bias: Option<MarketBias>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    pub extraction_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_snippet: Option<String>,
}

impl Signal {
    /// Direction implied by the ordering of the three price levels.
    ///
    /// Returns `None` when the levels are not strictly ordered either way.
    pub fn direction(&self) -> Option<Direction> {
        if self.stop_loss < self.entry_level && self.entry_level < self.take_profit {
            Some(Direction::Long)
        } else if self.take_profit < self.entry_level && self.entry_level < self.stop_loss {
            Some(Direction::Short)
        } else {
            None
        }
    }

    /// Distance to take-profit divided by distance to stop-loss
    pub fn risk_reward(&self) -> Option<Decimal> {
        let risk = (self.entry_level - self.stop_loss).abs();
        if risk.is_zero() {
            return None;
        }
        (self.take_profit - self.entry_level).abs().checked_div(risk)
    }
}

/// Round a price to cents, halves away from zero
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a confidence percentage to one decimal place
pub fn round_confidence(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round a sentiment score to three decimal places
pub fn round_score(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
