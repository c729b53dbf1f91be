//! Core business logic abstractions

pub mod cache;
pub mod clock;
pub mod config;
pub mod conversion;
pub mod error;
pub mod format;
pub mod handoff;
pub mod log;
pub mod market;
pub mod pricing;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for cleaner imports
pub use cache::MarketPriceCache;
pub use conversion::{ConversionRequest, ConversionResult, ConversionService};
pub use error::{ErrorBody, ExchangeError};
pub use market::{MarketPair, MarketPriceSnapshot, MarketPriceSource};
pub use pricing::{Direction, compute_profit, convert};
pub use settings::{ExchangeSettings, SettingsStore, SettingsView};
