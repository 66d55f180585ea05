//! Core library for loandesk.
//!
//! This crate provides everything the admin console needs apart from
//! presentation:
//!
//! - `auth`: credential decoding, token storage and the `SessionGuard`
//! - `api`: the authenticated REST client for the loan backend
//! - `models`: typed customers, loan packages and server responses
//! - `config`: persisted client configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Credential, SessionGuard, TokenStore};
pub use config::Config;
