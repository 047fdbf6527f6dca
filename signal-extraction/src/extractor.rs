// Signal Extractor
// Turns model prose and calculation-engine output into normalized signals

use crate::calculation::{CalculationAdapter, CalculationResult};
use crate::confidence::ConfidenceParser;
use crate::config::ExtractionConfig;
use crate::error::{ensure_reference, ExtractionError};
use crate::fallback::FallbackSynthesizer;
use crate::patterns::{normalize_text, PatternMatcher, PriceField};
use crate::plausibility::PlausibilityFilter;
use crate::validator::SignalValidator;
use common::{round_score, Direction, Signal, SignalMethod};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Entry point for both extraction paths.
///
/// Holds only immutable configuration; a single instance can be shared across
/// threads and called concurrently. Every call returns a structurally valid
/// [`Signal`]; `extraction_success` is the only indication of degraded quality.
///
/// Text signals take their direction from the entry's position against the
/// reference price. Calculation signals take it from their own levels: a stop
/// below the entry is a long and a stop above it a short.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    config: ExtractionConfig,
    matcher: PatternMatcher,
    confidence: ConfidenceParser,
    validator: SignalValidator,
    adapter: CalculationAdapter,
    fallback: FallbackSynthesizer,
}

impl SignalExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            matcher: PatternMatcher::new(PlausibilityFilter::new(&config.plausibility)),
            confidence: ConfidenceParser::new(config.validation.default_confidence),
            validator: SignalValidator::new(config.validation.clone()),
            adapter: CalculationAdapter::new(config.calculation.clone()),
            fallback: FallbackSynthesizer::new(config.fallback.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract a signal from generative-model text
    pub fn extract_from_text(&self, text: &str, reference: Decimal) -> Signal {
        match self.try_extract_from_text(text, reference) {
            Ok(signal) => signal,
            Err(e) => {
                warn!("Error extracting from model text: {}", e);
                self.fallback.text_signal(reference)
            }
        }
    }

    fn try_extract_from_text(&self, text: &str, reference: Decimal) -> Result<Signal, ExtractionError> {
        ensure_reference(reference)?;
        let normalized = normalize_text(text);

        let entry = self.matcher.find(&normalized, PriceField::Entry, reference);
        let stop_loss = self.matcher.find(&normalized, PriceField::StopLoss, reference);
        let take_profit = self.matcher.find(&normalized, PriceField::TakeProfit, reference);
        let parsed_confidence = self.confidence.parse(&normalized);

        let extracted_any = entry.is_some()
            || stop_loss.is_some()
            || take_profit.is_some()
            || parsed_confidence.is_some();

        let confidence = if extracted_any {
            parsed_confidence.unwrap_or(self.config.validation.default_confidence)
        } else {
            warn!("Nothing extractable in model text, using default offsets");
            self.fallback.confidence()
        };

        debug!(
            "Extracted entry={:?} sl={:?} tp={:?} conf={:?}",
            entry, stop_loss, take_profit, parsed_confidence
        );

        let levels = self
            .validator
            .validate(entry, stop_loss, take_profit, Some(confidence), reference);

        Ok(Signal {
            method: SignalMethod::Text,
            entry_level: levels.entry,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            confidence: levels.confidence,
            market_bias: None,
            sentiment_score: None,
            extraction_success: extracted_any && levels.valid,
            raw_snippet: Some(text.chars().take(self.config.snippet_max_chars).collect()),
        })
    }

    /// Adapt a typed calculation-engine result
    pub fn extract_from_calculation(&self, result: &CalculationResult, reference: Decimal) -> Signal {
        match self.try_extract_from_calculation(result, reference) {
            Ok(signal) => signal,
            Err(e) => {
                warn!("Error extracting from calculation result: {}", e);
                self.fallback.calculation_signal(reference)
            }
        }
    }

    /// Adapt raw calculation-engine JSON, selecting the plan for `asset`
    pub fn extract_from_calculation_json(
        &self,
        value: &serde_json::Value,
        asset: &str,
        reference: Decimal,
    ) -> Signal {
        match CalculationResult::from_json(value, asset) {
            Ok(result) => self.extract_from_calculation(&result, reference),
            Err(e) => {
                warn!("Error decoding calculation result: {}", e);
                self.fallback.calculation_signal(reference)
            }
        }
    }

    fn try_extract_from_calculation(
        &self,
        result: &CalculationResult,
        reference: Decimal,
    ) -> Result<Signal, ExtractionError> {
        let adapted = self.adapter.adapt(result, reference)?;

        // Adapted levels carry their own direction; the reference threshold
        // only decides when stop and entry coincide
        let direction = match adapted.stop_loss.cmp(&adapted.entry) {
            Ordering::Less => Direction::Long,
            Ordering::Greater => Direction::Short,
            Ordering::Equal => self.validator.classify(adapted.entry, reference),
        };

        let levels = self.validator.validate_directed(
            direction,
            adapted.entry,
            Some(adapted.stop_loss),
            Some(adapted.take_profit),
            Some(adapted.confidence),
        );

        let analysis = &result.market_analysis;
        let signal = Signal {
            method: SignalMethod::Calculation,
            entry_level: levels.entry,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            confidence: levels.confidence,
            market_bias: Some(analysis.market_bias),
            sentiment_score: Some(round_score(analysis.sentiment_score)),
            extraction_success: levels.valid,
            raw_snippet: None,
        };

        info!(
            "Calculation signal ({}): entry={} sl={} tp={} conf={} rr={:?}",
            analysis.market_bias,
            signal.entry_level,
            signal.stop_loss,
            signal.take_profit,
            signal.confidence,
            signal.risk_reward()
        );
        Ok(signal)
    }
}

impl Default for SignalExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculation::{MarketAnalysis, TradingPlan};
    use common::MarketBias;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_text_extraction() {
        let extractor = SignalExtractor::default();
        let text = "BTC looks strong. Entry around $51,200, stop loss $49,900, take profit $53,500. Confidence: 78%";
        let signal = extractor.extract_from_text(text, dec!(51300));

        assert_eq!(signal.method, SignalMethod::Text);
        assert_eq!(signal.entry_level, dec!(51200));
        assert_eq!(signal.stop_loss, dec!(49900));
        assert_eq!(signal.take_profit, dec!(53500));
        assert_eq!(signal.confidence, 78.0);
        assert!(signal.extraction_success);
        assert_eq!(signal.raw_snippet.as_deref(), Some(text));
    }

    #[test]
    fn test_partial_text_fills_defaults() {
        let extractor = SignalExtractor::default();
        let signal = extractor.extract_from_text("Buy near $100", dec!(100));

        assert_eq!(signal.entry_level, dec!(100));
        assert_eq!(signal.stop_loss, dec!(97));
        assert_eq!(signal.take_profit, dec!(103));
        assert_eq!(signal.confidence, 65.0);
        assert!(signal.extraction_success);
    }

    #[test]
    fn test_snippet_is_truncated() {
        let mut config = ExtractionConfig::default();
        config.snippet_max_chars = 10;
        let extractor = SignalExtractor::new(config);

        let signal = extractor.extract_from_text("entry at 100 with a long explanation", dec!(100));
        assert_eq!(signal.raw_snippet.as_deref(), Some("entry at 1"));
    }

    #[test]
    fn test_invalid_reference_falls_back() {
        let extractor = SignalExtractor::default();
        let signal = extractor.extract_from_text("entry at 100", Decimal::ZERO);

        assert!(!signal.extraction_success);
        assert_eq!(signal.confidence, 50.0);
        assert_eq!(signal.raw_snippet.as_deref(), Some("Extraction failed - using fallback values"));
    }

    #[test]
    fn test_calculation_plan_keeps_short_direction() {
        let extractor = SignalExtractor::default();
        let result = CalculationResult::new(MarketAnalysis {
            market_bias: MarketBias::Bearish,
            confidence: 66.0,
            sentiment_score: -0.2871,
        })
        .with_plan(TradingPlan {
            current_price: dec!(50000),
            entry_low: Some(dec!(49900)),
            entry_high: Some(dec!(50100)),
            target1: Some(dec!(48000)),
            stop_loss: Some(dec!(51000)),
            position_confidence: Some(61.4),
        });

        // Entry is at the reference price, yet the plan is a short
        let signal = extractor.extract_from_calculation(&result, dec!(50000));
        assert_eq!(signal.entry_level, dec!(50000));
        assert_eq!(signal.take_profit, dec!(48000));
        assert_eq!(signal.stop_loss, dec!(51000));
        assert_eq!(signal.direction(), Some(Direction::Short));
        assert_eq!(signal.confidence, 61.4);
        assert_eq!(signal.sentiment_score, Some(-0.287));
        assert_eq!(signal.market_bias, Some(MarketBias::Bearish));
        assert!(signal.extraction_success);
    }

    #[test]
    fn test_calculation_plan_with_wrong_side_target_is_repaired() {
        let extractor = SignalExtractor::default();
        let result = CalculationResult::new(MarketAnalysis {
            market_bias: MarketBias::Bullish,
            confidence: 66.0,
            sentiment_score: 0.1,
        })
        .with_plan(TradingPlan {
            current_price: dec!(100),
            entry_low: Some(dec!(99)),
            entry_high: Some(dec!(101)),
            target1: Some(dec!(98)),
            stop_loss: Some(dec!(97)),
            position_confidence: None,
        });

        let signal = extractor.extract_from_calculation(&result, dec!(100));
        assert_eq!(signal.stop_loss, dec!(97));
        assert_eq!(signal.take_profit, dec!(103));
        assert_eq!(signal.confidence, 66.0);
    }

    #[test]
    fn test_calculation_json_fallback() {
        let extractor = SignalExtractor::default();
        let signal = extractor.extract_from_calculation_json(&json!({"bias": "up"}), "BTC", dec!(50000));

        assert_eq!(signal.method, SignalMethod::Calculation);
        assert!(!signal.extraction_success);
        assert_eq!(signal.entry_level, dec!(49950));
        assert_eq!(signal.stop_loss, dec!(48500));
        assert_eq!(signal.take_profit, dec!(51500));
        assert_eq!(signal.market_bias, Some(MarketBias::Neutral));
    }

    #[test]
    fn test_calculation_json_with_unpriced_plans_keeps_bias() {
        let extractor = SignalExtractor::default();
        let value = json!({
            "market_analysis": {"market_bias": "BULLISH", "confidence": 75, "sentiment_score": 0.2816},
            "trading_plans": {"BTC": {}, "ETH": {}}
        });
        let signal = extractor.extract_from_calculation_json(&value, "BTC", dec!(50000));

        assert_eq!(signal.entry_level, dec!(49900));
        assert_eq!(signal.stop_loss, dec!(48500));
        assert_eq!(signal.take_profit, dec!(51500));
        assert_eq!(signal.confidence, 75.0);
        assert_eq!(signal.market_bias, Some(MarketBias::Bullish));
        assert_eq!(signal.sentiment_score, Some(0.282));
        assert!(signal.extraction_success);
    }

    #[test]
    fn test_reference_near_max_falls_back() {
        let extractor = SignalExtractor::default();
        let signal = extractor.extract_from_text("entry at 100", Decimal::MAX);
        assert!(!signal.extraction_success);

        let result = CalculationResult::new(MarketAnalysis {
            market_bias: MarketBias::Bullish,
            confidence: 75.0,
            sentiment_score: 0.0,
        });
        let signal = extractor.extract_from_calculation(&result, Decimal::MAX);
        assert!(!signal.extraction_success);
        assert_eq!(signal.market_bias, Some(MarketBias::Neutral));
    }

    #[test]
    fn test_sub_dollar_calculation_is_ordered() {
        let extractor = SignalExtractor::default();
        let result = CalculationResult::new(MarketAnalysis {
            market_bias: MarketBias::Neutral,
            confidence: 55.0,
            sentiment_score: 0.0,
        });
        let signal = extractor.extract_from_calculation(&result, dec!(0.3));

        assert_eq!(signal.entry_level, dec!(0.30));
        assert_eq!(signal.stop_loss, dec!(0.29));
        assert_eq!(signal.take_profit, dec!(0.31));
        assert_eq!(signal.direction(), Some(Direction::Long));
    }
}
