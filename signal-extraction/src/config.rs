//! Extraction policy configuration
//!
//! Every offset, band and default used by the extraction core lives here so
//! that callers (and tests) can override the policy without touching code.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the signal extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum characters of raw model text retained on a signal
    #[serde(default = "default_snippet_max_chars")]
    pub snippet_max_chars: usize,

    /// Price plausibility window around the reference price
    #[serde(default)]
    pub plausibility: PlausibilityConfig,

    /// Directional consistency and confidence policy
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Offsets used when the calculation engine provides no trading plan
    #[serde(default)]
    pub calculation: CalculationConfig,

    /// Values emitted when extraction fails outright
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            snippet_max_chars: default_snippet_max_chars(),
            plausibility: PlausibilityConfig::default(),
            validation: ValidationConfig::default(),
            calculation: CalculationConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}

fn default_snippet_max_chars() -> usize {
    500
}

impl ExtractionConfig {
    /// Reject policies that cannot produce ordered signals
    pub fn check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.plausibility.band > Decimal::ZERO && self.plausibility.band < Decimal::ONE,
            "plausibility band must be in (0, 1), got {}",
            self.plausibility.band
        );
        anyhow::ensure!(
            self.validation.stop_offset > Decimal::ZERO && self.validation.stop_offset < Decimal::ONE,
            "stop offset must be in (0, 1), got {}",
            self.validation.stop_offset
        );
        anyhow::ensure!(
            self.validation.take_profit_offset > Decimal::ZERO
                && self.validation.take_profit_offset < Decimal::ONE,
            "take-profit offset must be in (0, 1), got {}",
            self.validation.take_profit_offset
        );
        anyhow::ensure!(
            self.validation.min_confidence <= self.validation.default_confidence
                && self.validation.default_confidence <= self.validation.max_confidence,
            "default confidence {} outside [{}, {}]",
            self.validation.default_confidence,
            self.validation.min_confidence,
            self.validation.max_confidence
        );
        anyhow::ensure!(self.snippet_max_chars > 0, "snippet_max_chars must be positive");

        let calc = &self.calculation;
        let factors = [
            ("validation.default_entry_factor", self.validation.default_entry_factor),
            ("calculation.bullish", calc.bullish.max_factor()),
            ("calculation.bearish", calc.bearish.max_factor()),
            ("calculation.neutral", calc.neutral.max_factor()),
        ];
        for (name, factor) in factors {
            anyhow::ensure!(
                factor > Decimal::ZERO && factor < Decimal::TWO,
                "{} factor must be in (0, 2), got {}",
                name,
                factor
            );
        }
        Ok(())
    }
}

/// Plausibility window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlausibilityConfig {
    /// Accept candidates within reference * (1 +/- band)
    pub band: Decimal,
}

impl Default for PlausibilityConfig {
    fn default() -> Self {
        Self { band: dec!(0.20) }
    }
}

/// Signal validator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Entry at or below reference * this factor is treated as long
    pub long_threshold: Decimal,

    /// Entry used when none was extracted (reference * factor)
    pub default_entry_factor: Decimal,

    /// Stop-loss distance from entry when missing or inconsistent
    pub stop_offset: Decimal,

    /// Take-profit distance from entry when missing or inconsistent
    pub take_profit_offset: Decimal,

    /// Confidence used when missing or out of bounds (percent)
    pub default_confidence: f64,

    pub min_confidence: f64,
    pub max_confidence: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            long_threshold: dec!(1.001),
            default_entry_factor: dec!(0.999),
            stop_offset: dec!(0.03),
            take_profit_offset: dec!(0.03),
            default_confidence: 65.0,
            min_confidence: 10.0,
            max_confidence: 95.0,
        }
    }
}

/// Price factors (relative to the reference price) for one market bias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasOffsets {
    pub entry_factor: Decimal,
    /// Target used when confidence exceeds the strong threshold
    pub strong_target_factor: Decimal,
    pub target_factor: Decimal,
    pub stop_factor: Decimal,
}

impl BiasOffsets {
    fn max_factor(&self) -> Decimal {
        self.entry_factor
            .max(self.strong_target_factor)
            .max(self.target_factor)
            .max(self.stop_factor)
    }
}

/// Calculation adapter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    /// Confidence above which the wider target is used
    pub strong_confidence_threshold: f64,

    /// Neutral bias never reports more confidence than this
    pub neutral_confidence_cap: f64,

    pub bullish: BiasOffsets,
    pub bearish: BiasOffsets,
    pub neutral: BiasOffsets,
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            strong_confidence_threshold: 70.0,
            neutral_confidence_cap: 60.0,
            bullish: BiasOffsets {
                entry_factor: dec!(0.998),
                strong_target_factor: dec!(1.03),
                target_factor: dec!(1.02),
                stop_factor: dec!(0.97),
            },
            bearish: BiasOffsets {
                entry_factor: dec!(1.002),
                strong_target_factor: dec!(0.97),
                target_factor: dec!(0.98),
                stop_factor: dec!(1.03),
            },
            neutral: BiasOffsets {
                entry_factor: dec!(0.999),
                strong_target_factor: dec!(1.015),
                target_factor: dec!(1.015),
                stop_factor: dec!(0.985),
            },
        }
    }
}

/// Fallback synthesizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub entry_factor: Decimal,
    pub stop_factor: Decimal,
    pub take_profit_factor: Decimal,
    pub confidence: f64,
    /// Snippet stored on text signals produced by the fallback
    pub snippet: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            entry_factor: dec!(0.999),
            stop_factor: dec!(0.97),
            take_profit_factor: dec!(1.03),
            confidence: 50.0,
            snippet: "Extraction failed - using fallback values".to_string(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<ExtractionConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ExtractionConfig = toml::from_str(&content)?;
    config.check()?;
    Ok(config)
}

/// Save configuration to TOML file
pub fn save_config(config: &ExtractionConfig, path: &str) -> anyhow::Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Create a default configuration file template
pub fn create_config_template(path: &str) -> anyhow::Result<()> {
    let template = "# Signal Extraction Configuration
# Omitted keys fall back to the built-in defaults

# Characters of raw model output kept on text signals
snippet_max_chars = 500

[plausibility]
# Extracted prices must lie within reference * (1 +/- band)
band = \"0.20\"

[validation]
# Entry <= reference * long_threshold is a long setup
long_threshold = \"1.001\"
# Entry used when the text names none
default_entry_factor = \"0.999\"
# Stop / target distance from entry when missing or on the wrong side
stop_offset = \"0.03\"
take_profit_offset = \"0.03\"
# Confidence outside [min, max] is replaced by the default (percent)
default_confidence = 65.0
min_confidence = 10.0
max_confidence = 95.0

[calculation]
strong_confidence_threshold = 70.0
neutral_confidence_cap = 60.0

[calculation.bullish]
entry_factor = \"0.998\"
strong_target_factor = \"1.03\"
target_factor = \"1.02\"
stop_factor = \"0.97\"

[calculation.bearish]
entry_factor = \"1.002\"
strong_target_factor = \"0.97\"
target_factor = \"0.98\"
stop_factor = \"1.03\"

[calculation.neutral]
entry_factor = \"0.999\"
strong_target_factor = \"1.015\"
target_factor = \"1.015\"
stop_factor = \"0.985\"

[fallback]
entry_factor = \"0.999\"
stop_factor = \"0.97\"
take_profit_factor = \"1.03\"
confidence = 50.0
snippet = \"Extraction failed - using fallback values\"
";

    std::fs::write(path, template)?;
    Ok(())
}
