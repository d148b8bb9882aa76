//! # Focus API
//! 
//! HTTP handlers, response envelope, and router for the conversation history service.

pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::{AppState, HistoryCache};
