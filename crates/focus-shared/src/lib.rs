//! # Focus Shared
//! 
//! Shared configuration, telemetry, and error types for the Focus Hub services.

pub mod config;
pub mod constants;
pub mod error;
pub mod telemetry;

pub use error::AppError;
