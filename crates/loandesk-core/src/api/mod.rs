//! REST API client module for the loan management backend.
//!
//! This module provides the `ApiClient` for managing customers and loan
//! packages, asking the backend for approval decisions and package
//! recommendations, and reading the dashboard aggregates.
//!
//! The backend uses JWT bearer token authentication; the token is
//! obtained from `/login` and kept in the session's `TokenStore`.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::{ApiError, GENERIC_FAILURE_MESSAGE};
