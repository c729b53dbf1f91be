//! Error taxonomy for conversion and administrator requests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced to callers of the exchange service. Every variant is
/// terminal for the request that produced it.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Amount missing, non-numeric, not finite or not positive.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Direction is not one of the two supported legs.
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    /// Administrator USDT→TZS rate is unset or not positive.
    #[error("Admin USDT→TZS rate not set")]
    SettingsInvalid,

    /// No usable bridge price after a fetch attempt.
    #[error("Failed to fetch market price: {0}")]
    MarketUnavailable(String),

    #[error("Invalid password")]
    AuthFailed,

    /// Administrator-supplied rate rejected.
    #[error("Invalid USDT->TZS rate: {0}")]
    ValidationFailed(String),

    /// Settings collaborator could not be read or written.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ExchangeError {
    /// Stable machine-readable identifier of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ExchangeError::InvalidAmount(_) => "invalid_amount",
            ExchangeError::InvalidDirection(_) => "invalid_direction",
            ExchangeError::SettingsInvalid => "settings_invalid",
            ExchangeError::MarketUnavailable(_) => "market_unavailable",
            ExchangeError::AuthFailed => "auth_failed",
            ExchangeError::ValidationFailed(_) => "validation_failed",
            ExchangeError::Storage(_) => "storage",
        }
    }
}

/// Structured error returned to untrusted clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl From<&ExchangeError> for ErrorBody {
    fn from(err: &ExchangeError) -> Self {
        ErrorBody {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
