//! Database module (durable store adapters)

pub mod connection;
pub mod conversation_repo_impl;
pub mod memory;

pub use connection::{create_pool, run_migrations};
pub use conversation_repo_impl::PgConversationStore;
pub use memory::MemoryConversationStore;
