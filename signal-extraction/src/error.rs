use rust_decimal::Decimal;
use thiserror::Error;

/// Failures inside the extraction core.
///
/// These never reach callers of [`crate::SignalExtractor`]; every variant is
/// recovered locally by the fallback synthesizer.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("reference price must be positive, got {0}")]
    InvalidReference(Decimal),

    #[error("malformed calculation result: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error("trading plan has out-of-range {field}: {value}")]
    InvalidPlan { field: &'static str, value: Decimal },
}

/// Largest multiple of a price the pipeline may compute: an entry up to twice
/// the reference, offset again by less than its own size.
const PRICE_HEADROOM: u32 = 4;

pub(crate) fn ensure_reference(reference: Decimal) -> Result<(), ExtractionError> {
    if reference <= Decimal::ZERO {
        return Err(ExtractionError::InvalidReference(reference));
    }
    ensure_scalable(reference)
}

/// Rejects prices too close to `Decimal::MAX` to scale without overflow
pub(crate) fn ensure_scalable(price: Decimal) -> Result<(), ExtractionError> {
    match price.checked_mul(Decimal::from(PRICE_HEADROOM)) {
        Some(_) => Ok(()),
        None => Err(ExtractionError::InvalidReference(price)),
    }
}
