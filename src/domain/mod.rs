//! Domain layer for agentdeck
//!
//! Core models, port traits, and domain errors.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult, EnvValidationError};
