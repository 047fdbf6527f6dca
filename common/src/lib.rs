//! Shared domain types for the prediction signal workspace.
//!
//! Both extraction paths (generative-model text and calculation-engine output)
//! emit the same [`Signal`] record; persistence backends store it as a
//! [`PredictionRecord`].

pub mod record;
pub mod signal;

pub use record::PredictionRecord;
pub use signal::{
    round_confidence, round_price, round_score, Direction, MarketBias, Signal, SignalMethod,
};

// Re-export for downstream crates
pub use chrono::{DateTime, Utc};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
