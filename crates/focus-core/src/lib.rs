//! # Focus Core
//! 
//! Domain types, store ports, and the conversation history cache service.

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::HistoryCacheConfig;
pub use domain::*;
pub use error::{HistoryError, StoreKind};
pub use services::{CacheStatsSnapshot, ConversationHistoryCache, HealthReport};
