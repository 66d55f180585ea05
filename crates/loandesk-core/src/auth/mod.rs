//! Authentication module: the session guard and everything it reads.
//!
//! This module provides:
//! - `Credential`: the backend-issued access token, decoded for its expiry
//! - `TokenStore`: where the token lives between runs (file, keychain, memory)
//! - `SessionGuard`: the validity check every backend action goes through
//!
//! Tokens are never renewed client-side; an expired one is removed and
//! the user has to log in again.

pub mod credentials;
pub mod session;
pub mod store;
pub mod token;

pub use credentials::KeyringTokenStore;
pub use session::SessionGuard;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use token::{Credential, TokenError};
