//! # Focus Core - Domain Module
//! 
//! Conversation turns and the agent routing tag they carry.

pub mod agent;
pub mod turn;

pub use agent::AgentKind;
pub use turn::{ConversationTurn, Metadata, NewTurn, UserId};
