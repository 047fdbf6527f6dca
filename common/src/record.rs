use crate::signal::{Signal, SignalMethod};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A signal as handed to persistence: flattened, dated and annotated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub date: String, // YYYY-MM-DD (UTC)
    pub time: String, // HH:MM (UTC)
    pub method: SignalMethod,
    pub entry_level: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub confidence: f64,
    pub coin: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn from_signal(
        signal: &Signal,
        coin: &str,
        notes: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: timestamp.format("%Y-%m-%d").to_string(),
            time: timestamp.format("%H:%M").to_string(),
            method: signal.method,
            entry_level: signal.entry_level,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            confidence: signal.confidence,
            coin: coin.to_string(),
            notes: notes.into(),
            created_at: timestamp,
        }
    }
}
