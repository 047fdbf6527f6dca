//! Calculation engine adapter
//!
//! The calculation engine reports a market-analysis summary and, when it has
//! enough data, a per-asset trading plan. Both map onto the same price levels
//! the text path produces.

use crate::config::{BiasOffsets, CalculationConfig};
use crate::error::{ensure_reference, ensure_scalable, ExtractionError};
use common::MarketBias;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Market-analysis summary from the calculation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub market_bias: MarketBias,
    #[serde(default = "default_analysis_confidence")]
    pub confidence: f64, // 0.0 to 100.0
    #[serde(default)]
    pub sentiment_score: f64,
}

fn default_analysis_confidence() -> f64 {
    50.0
}

/// Per-asset trading plan from the calculation engine
///
/// The engine reports `{}` for an asset it could not price, so every level is
/// optional. Extra reporting fields (`plan_bias`, `target2`, `rrr1`, ...) are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradingPlan {
    /// Price the plan was computed against; plans at zero are ignored
    #[serde(default)]
    pub current_price: Decimal,
    #[serde(default)]
    pub entry_low: Option<Decimal>,
    #[serde(default)]
    pub entry_high: Option<Decimal>,
    #[serde(default)]
    pub target1: Option<Decimal>,
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    #[serde(default)]
    pub position_confidence: Option<f64>,
}

/// Levels of a complete plan: entry band, first target and stop
#[derive(Debug, Clone, Copy, PartialEq)]
struct PlanLevels {
    entry_low: Decimal,
    entry_high: Decimal,
    target1: Decimal,
    stop_loss: Decimal,
}

impl TradingPlan {
    /// Levels of a usable plan: priced and with every level present
    fn levels(&self) -> Option<PlanLevels> {
        if self.current_price <= Decimal::ZERO {
            return None;
        }
        Some(PlanLevels {
            entry_low: self.entry_low?,
            entry_high: self.entry_high?,
            target1: self.target1?,
            stop_loss: self.stop_loss?,
        })
    }
}

impl PlanLevels {
    fn check(&self) -> Result<(), ExtractionError> {
        let fields = [
            ("entry_low", self.entry_low),
            ("entry_high", self.entry_high),
            ("target1", self.target1),
            ("stop_loss", self.stop_loss),
        ];
        for (field, value) in fields {
            if value <= Decimal::ZERO || ensure_scalable(value).is_err() {
                return Err(ExtractionError::InvalidPlan { field, value });
            }
        }
        Ok(())
    }

    fn entry(&self) -> Decimal {
        (self.entry_low + self.entry_high) / Decimal::from(2)
    }
}

/// Structured calculation-engine output for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub market_analysis: MarketAnalysis,
    #[serde(default)]
    pub trading_plan: Option<TradingPlan>,
}

/// Shapes the engine emits: a full prediction result or a bare analysis.
/// Plans stay undecoded so a bad entry for one asset cannot spoil another.
#[derive(Deserialize)]
#[serde(untagged)]
enum CalculationPayload {
    Full {
        market_analysis: MarketAnalysis,
        #[serde(default)]
        trading_plans: HashMap<String, serde_json::Value>,
    },
    Analysis(MarketAnalysis),
}

impl CalculationResult {
    pub fn new(market_analysis: MarketAnalysis) -> Self {
        Self {
            market_analysis,
            trading_plan: None,
        }
    }

    pub fn with_plan(mut self, plan: TradingPlan) -> Self {
        self.trading_plan = Some(plan);
        self
    }

    /// Decode engine JSON, selecting the trading plan for `asset` if present
    pub fn from_json(value: &serde_json::Value, asset: &str) -> Result<Self, ExtractionError> {
        let result = match CalculationPayload::deserialize(value)? {
            CalculationPayload::Full {
                market_analysis,
                mut trading_plans,
            } => {
                let trading_plan = match trading_plans.remove(asset) {
                    Some(serde_json::Value::Null) | None => None,
                    Some(plan) => Some(TradingPlan::deserialize(plan)?),
                };
                Self {
                    market_analysis,
                    trading_plan,
                }
            }
            CalculationPayload::Analysis(market_analysis) => Self::new(market_analysis),
        };
        Ok(result)
    }
}

/// Levels produced by the adapter, before validation
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptedLevels {
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub confidence: f64,
    pub from_plan: bool,
}

/// Maps calculation results onto entry / stop / target levels
#[derive(Debug, Clone)]
pub struct CalculationAdapter {
    config: CalculationConfig,
}

impl CalculationAdapter {
    pub fn new(config: CalculationConfig) -> Self {
        Self { config }
    }

    pub fn adapt(
        &self,
        result: &CalculationResult,
        reference: Decimal,
    ) -> Result<AdaptedLevels, ExtractionError> {
        ensure_reference(reference)?;
        let analysis = &result.market_analysis;

        let plan = result
            .trading_plan
            .as_ref()
            .and_then(|plan| Some((plan.levels()?, plan.position_confidence)));

        if let Some((levels, position_confidence)) = plan {
            levels.check()?;
            let entry = levels.entry();
            info!(
                "Using trading plan: entry={} tp={} sl={}",
                entry, levels.target1, levels.stop_loss
            );
            return Ok(AdaptedLevels {
                entry,
                stop_loss: levels.stop_loss,
                take_profit: levels.target1,
                confidence: position_confidence.unwrap_or(analysis.confidence),
                from_plan: true,
            });
        }

        info!("No trading plan, deriving levels from {} bias", analysis.market_bias);
        let (offsets, confidence) = match analysis.market_bias {
            MarketBias::Bullish => (&self.config.bullish, analysis.confidence),
            MarketBias::Bearish => (&self.config.bearish, analysis.confidence),
            MarketBias::Neutral => (
                &self.config.neutral,
                analysis.confidence.min(self.config.neutral_confidence_cap),
            ),
        };

        Ok(self.from_offsets(offsets, analysis.confidence, confidence, reference))
    }

    fn from_offsets(
        &self,
        offsets: &BiasOffsets,
        raw_confidence: f64,
        confidence: f64,
        reference: Decimal,
    ) -> AdaptedLevels {
        let target_factor = if raw_confidence > self.config.strong_confidence_threshold {
            offsets.strong_target_factor
        } else {
            offsets.target_factor
        };
        debug!("Bias offsets: {:?}, target factor {}", offsets, target_factor);

        AdaptedLevels {
            entry: reference * offsets.entry_factor,
            stop_loss: reference * offsets.stop_factor,
            take_profit: reference * target_factor,
            confidence,
            from_plan: false,
        }
    }
}

impl Default for CalculationAdapter {
    fn default() -> Self {
        Self::new(CalculationConfig::default())
    }
}
