use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::store::TokenStore;
use super::token::Credential;
use crate::api::ApiError;

/// Decides whether the client holds a usable credential and gates
/// every backend action behind it.
///
/// Validity is computed fresh on every check from the token store;
/// nothing is cached in the guard. Clone is cheap and shares the store.
#[derive(Clone)]
pub struct SessionGuard {
    store: Arc<dyn TokenStore>,
}

impl SessionGuard {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_store(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// True iff a stored token exists and has not expired.
    ///
    /// An expired or undecodable token is removed from the store
    /// before returning false.
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.credential_at(now).is_some()
    }

    /// The stored credential, if it is still valid.
    pub fn credential(&self) -> Option<Credential> {
        self.credential_at(Utc::now())
    }

    pub fn credential_at(&self, now: DateTime<Utc>) -> Option<Credential> {
        let token = match self.store.get() {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                return None;
            }
        };

        match Credential::parse(&token) {
            Ok(credential) if credential.is_valid_at(now) => Some(credential),
            Ok(credential) => {
                debug!(expiry = credential.expiry(), "Stored token expired, clearing");
                self.discard();
                None
            }
            Err(e) => {
                warn!(error = %e, "Stored token could not be decoded, clearing");
                self.discard();
                None
            }
        }
    }

    /// Run `action` with the current credential, or fail with
    /// `ApiError::LoginRequired` without running it at all.
    pub async fn guard<F, Fut, T>(&self, action: F) -> Result<T>
    where
        F: FnOnce(Credential) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let credential = self.credential().ok_or(ApiError::LoginRequired)?;
        action(credential).await
    }

    /// Replace the stored token after a successful login.
    pub fn store_token(&self, token: &str) -> Result<()> {
        self.store.set(token)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }

    fn discard(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }
    }
}
