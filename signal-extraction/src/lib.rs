// Signal Extraction
// Normalizes generative-model forecasts and calculation-engine output into trading signals

pub mod calculation;
pub mod confidence;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod patterns;
pub mod plausibility;
pub mod storage;
pub mod validator;

pub use calculation::{AdaptedLevels, CalculationAdapter, CalculationResult, MarketAnalysis, TradingPlan};
pub use confidence::ConfidenceParser;
pub use config::{
    create_config_template, load_config, save_config, BiasOffsets, CalculationConfig, ExtractionConfig,
    FallbackConfig, PlausibilityConfig, ValidationConfig,
};
pub use error::ExtractionError;
pub use extractor::SignalExtractor;
pub use fallback::FallbackSynthesizer;
pub use patterns::{normalize_text, PatternMatcher, PriceField};
pub use plausibility::PlausibilityFilter;
pub use storage::{
    format_price, save_extracted_predictions, signal_notes, InMemoryPredictionStore, JsonFilePredictionStore,
    PredictionStore, SaveContext, StoreStats,
};
pub use validator::{SignalValidator, ValidatedLevels};

// Re-export shared types for convenience
pub use common::{Direction, MarketBias, PredictionRecord, Signal, SignalMethod};
