//! Database models for the Stockpile Management Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
