//! Application-wide constants

pub const DEFAULT_MAX_HISTORY_LENGTH: usize = 50;
pub const DEFAULT_HISTORY_TTL_SECONDS: u64 = 60 * 60 * 24;
pub const CONVERSATION_KEY_PREFIX: &str = "conversation:";
pub const PRIMARY_AGENT_METADATA_KEY: &str = "primary_agent";

/// Environment variables read by the previous backend, still honoured as overrides.
pub const LEGACY_CACHE_LIMIT_ENV: &str = "CONVERSATION_CACHE_LIMIT";
pub const LEGACY_CACHE_TTL_ENV: &str = "CONVERSATION_CACHE_TTL";
