//! Shared types and domain logic for the Stockpile Management Platform
//!
//! This crate contains the models and the pure stock/history engines shared
//! between the backend and other components of the system.

pub mod history;
pub mod models;
pub mod stock;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
