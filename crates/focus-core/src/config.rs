//! Validated cache bounds

use std::time::Duration;

use focus_shared::config::HistorySettings;
use focus_shared::constants::{DEFAULT_HISTORY_TTL_SECONDS, DEFAULT_MAX_HISTORY_LENGTH};

use crate::error::HistoryError;

/// Maximum retained turns per user and the inactivity window of a fast-store entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCacheConfig {
    max_history_length: usize,
    ttl_seconds: u64,
}

impl HistoryCacheConfig {
    pub fn new(max_history_length: usize, ttl_seconds: u64) -> Result<Self, HistoryError> {
        if max_history_length == 0 {
            return Err(HistoryError::InvalidArgument(
                "max_history_length must be at least 1".to_string(),
            ));
        }
        if ttl_seconds == 0 {
            return Err(HistoryError::InvalidArgument(
                "ttl_seconds must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            max_history_length,
            ttl_seconds,
        })
    }

    pub fn max_history_length(&self) -> usize {
        self.max_history_length
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for HistoryCacheConfig {
    fn default() -> Self {
        Self {
            max_history_length: DEFAULT_MAX_HISTORY_LENGTH,
            ttl_seconds: DEFAULT_HISTORY_TTL_SECONDS,
        }
    }
}

impl TryFrom<&HistorySettings> for HistoryCacheConfig {
    type Error = HistoryError;

    fn try_from(settings: &HistorySettings) -> Result<Self, Self::Error> {
        HistoryCacheConfig::new(settings.max_history_length, settings.ttl_seconds)
    }
}
