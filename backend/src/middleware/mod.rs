//! Middleware for the Stockpile Management Platform

mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
