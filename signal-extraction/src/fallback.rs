use crate::config::FallbackConfig;
use crate::validator::{above, below};
use common::{round_confidence, round_price, MarketBias, Signal, SignalMethod};
use rust_decimal::Decimal;

/// Deterministic signal used when extraction or adaptation fails outright
#[derive(Debug, Clone)]
pub struct FallbackSynthesizer {
    config: FallbackConfig,
}

impl FallbackSynthesizer {
    pub fn new(config: FallbackConfig) -> Self {
        Self { config }
    }

    pub fn confidence(&self) -> f64 {
        self.config.confidence
    }

    fn base(&self, method: SignalMethod, reference: Decimal) -> Signal {
        let scale = |factor: Decimal| round_price(reference.checked_mul(factor).unwrap_or(Decimal::MAX));
        let entry = scale(self.config.entry_factor);
        Signal {
            method,
            entry_level: entry,
            stop_loss: below(entry, scale(self.config.stop_factor)),
            take_profit: above(entry, scale(self.config.take_profit_factor)),
            confidence: round_confidence(self.config.confidence),
            market_bias: None,
            sentiment_score: None,
            extraction_success: false,
            raw_snippet: None,
        }
    }

    /// Fallback for the text path
    pub fn text_signal(&self, reference: Decimal) -> Signal {
        Signal {
            raw_snippet: Some(self.config.snippet.clone()),
            ..self.base(SignalMethod::Text, reference)
        }
    }

    /// Fallback for the calculation path
    pub fn calculation_signal(&self, reference: Decimal) -> Signal {
        Signal {
            market_bias: Some(MarketBias::Neutral),
            sentiment_score: Some(0.0),
            ..self.base(SignalMethod::Calculation, reference)
        }
    }
}

impl Default for FallbackSynthesizer {
    fn default() -> Self {
        Self::new(FallbackConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Direction;
    use rust_decimal_macros::dec;

    #[test]
    fn test_text_fallback() {
        let signal = FallbackSynthesizer::default().text_signal(dec!(50000));

        assert_eq!(signal.method, SignalMethod::Text);
        assert_eq!(signal.entry_level, dec!(49950.00));
        assert_eq!(signal.stop_loss, dec!(48500.00));
        assert_eq!(signal.take_profit, dec!(51500.00));
        assert_eq!(signal.confidence, 50.0);
        assert!(!signal.extraction_success);
        assert_eq!(signal.raw_snippet.as_deref(), Some("Extraction failed - using fallback values"));
        assert_eq!(signal.direction(), Some(Direction::Long));
    }

    #[test]
    fn test_calculation_fallback() {
        let signal = FallbackSynthesizer::default().calculation_signal(dec!(100));

        assert_eq!(signal.method, SignalMethod::Calculation);
        assert_eq!(signal.entry_level, dec!(99.90));
        assert_eq!(signal.market_bias, Some(MarketBias::Neutral));
        assert_eq!(signal.sentiment_score, Some(0.0));
        assert!(signal.raw_snippet.is_none());
        assert!(!signal.extraction_success);
    }

    #[test]
    fn test_sub_dollar_fallback_is_ordered() {
        let signal = FallbackSynthesizer::default().calculation_signal(dec!(0.1));

        assert_eq!(signal.entry_level, dec!(0.10));
        assert_eq!(signal.stop_loss, dec!(0.09));
        assert_eq!(signal.take_profit, dec!(0.11));
    }

    #[test]
    fn test_fallback_near_max_does_not_overflow() {
        let signal = FallbackSynthesizer::default().text_signal(Decimal::MAX);
        assert!(signal.stop_loss < signal.entry_level);
        assert!(signal.entry_level < signal.take_profit);
    }
}
