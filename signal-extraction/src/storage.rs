// Prediction Storage Interface
// Persists extracted signals; the extraction core itself never touches storage

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::{PredictionRecord, Signal, SignalMethod};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Trait for prediction storage backends
#[async_trait::async_trait]
pub trait PredictionStore: Send + Sync {
    /// Store a prediction record
    async fn save(&self, record: &PredictionRecord) -> Result<()>;

    /// Most recent records first, optionally limited
    async fn load(&self, limit: Option<usize>) -> Result<Vec<PredictionRecord>>;

    /// Get storage statistics
    async fn stats(&self) -> Result<StoreStats>;
}

/// Storage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_records: usize,
    pub records_by_method: HashMap<String, usize>,
    pub oldest_record: Option<DateTime<Utc>>,
    pub newest_record: Option<DateTime<Utc>>,
}

impl StoreStats {
    fn from_records<'a>(records: impl IntoIterator<Item = &'a PredictionRecord>) -> Self {
        let mut stats = StoreStats::default();
        for record in records {
            stats.total_records += 1;
            *stats
                .records_by_method
                .entry(record.method.to_string())
                .or_insert(0) += 1;

            if stats.oldest_record.map_or(true, |t| record.created_at < t) {
                stats.oldest_record = Some(record.created_at);
            }
            if stats.newest_record.map_or(true, |t| record.created_at > t) {
                stats.newest_record = Some(record.created_at);
            }
        }
        stats
    }
}

fn newest_first(mut records: Vec<PredictionRecord>, limit: Option<usize>) -> Vec<PredictionRecord> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    if let Some(limit) = limit {
        records.truncate(limit);
    }
    records
}

/// In-memory prediction storage (for testing and development)
pub struct InMemoryPredictionStore {
    records: RwLock<Vec<PredictionRecord>>,
}

impl InMemoryPredictionStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryPredictionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PredictionStore for InMemoryPredictionStore {
    async fn save(&self, record: &PredictionRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn load(&self, limit: Option<usize>) -> Result<Vec<PredictionRecord>> {
        let records = self.records.read().await.clone();
        Ok(newest_first(records, limit))
    }

    async fn stats(&self) -> Result<StoreStats> {
        let records = self.records.read().await;
        Ok(StoreStats::from_records(records.iter()))
    }
}

/// Prediction storage backed by a single JSON array file
pub struct JsonFilePredictionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonFilePredictionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<PredictionRecord>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("corrupt prediction file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn write_all(&self, records: &[PredictionRecord]) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl PredictionStore for JsonFilePredictionStore {
    async fn save(&self, record: &PredictionRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        records.push(record.clone());
        self.write_all(&records).await?;
        debug!("Saved prediction {} to {}", record.id, self.path.display());
        Ok(())
    }

    async fn load(&self, limit: Option<usize>) -> Result<Vec<PredictionRecord>> {
        let _guard = self.lock.lock().await;
        Ok(newest_first(self.read_all().await?, limit))
    }

    async fn stats(&self) -> Result<StoreStats> {
        let _guard = self.lock.lock().await;
        let records = self.read_all().await?;
        Ok(StoreStats::from_records(records.iter()))
    }
}

/// Context attached to a pair of signals when they are persisted
#[derive(Debug, Clone)]
pub struct SaveContext {
    pub coin: String,
    pub reference_price: Decimal,
    pub test_mode: bool,
    pub timestamp: DateTime<Utc>,
}

impl SaveContext {
    pub fn new(coin: impl Into<String>, reference_price: Decimal) -> Self {
        Self {
            coin: coin.into(),
            reference_price,
            test_mode: false,
            timestamp: Utc::now(),
        }
    }

    pub fn test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Whole-unit price with thousands separators ("50,000")
pub fn format_price(price: Decimal) -> String {
    let rounded = price
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .abs()
        .trunc()
        .to_string();

    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if price.is_sign_negative() && !grouped.chars().all(|c| c == '0') {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Notes stored alongside a signal
pub fn signal_notes(signal: &Signal, context: &SaveContext) -> String {
    let price = format!("{}: ${}", context.coin, format_price(context.reference_price));
    let notes = match signal.method {
        SignalMethod::Text => format!(
            "{} | Extraction: {}",
            price,
            if signal.extraction_success { "Success" } else { "Fallback" }
        ),
        SignalMethod::Calculation => format!(
            "{} | Bias: {} | Score: {:.3}",
            price,
            signal
                .market_bias
                .map(|b| b.to_string())
                .unwrap_or_else(|| "NEUTRAL".to_string()),
            signal.sentiment_score.unwrap_or(0.0)
        ),
    };

    if context.test_mode {
        format!("[TEST] {}", notes)
    } else {
        notes
    }
}

/// Persist the text and calculation signals of one prediction cycle.
///
/// Returns true only when both records were stored. Failures are logged and
/// never raised.
pub async fn save_extracted_predictions(
    store: &dyn PredictionStore,
    text_signal: &Signal,
    calculation_signal: &Signal,
    context: &SaveContext,
) -> bool {
    let mut saved = Vec::with_capacity(2);
    for signal in [text_signal, calculation_signal] {
        let record = PredictionRecord::from_signal(
            signal,
            &context.coin,
            signal_notes(signal, context),
            context.timestamp,
        );
        match store.save(&record).await {
            Ok(()) => saved.push(true),
            Err(e) => {
                error!("Failed to save {} prediction: {:#}", signal.method, e);
                saved.push(false);
            }
        }
    }

    if saved.iter().all(|ok| *ok) {
        info!("Both predictions saved successfully");
        true
    } else {
        warn!("Partial save: text={}, calculation={}", saved[0], saved[1]);
        false
    }
}
