//! Session credential access.
//!
//! The access token is read at request time, once per outgoing call, and
//! never cached by the clients — the session may rotate underneath us at any
//! moment. Components that need the credential receive an explicit provider
//! instead of reaching for ambient global state.

use std::sync::Arc;

use parking_lot::RwLock;

/// Source of the current session's access token.
///
/// `None` means no session; the aggregation client then sends the request
/// without an Authorization header and lets the backend decide.
pub trait CredentialProvider: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

/// Shared token cell, refreshed externally by whatever owns the login flow.
///
/// Cloning yields another handle to the same cell.
#[derive(Clone, Default)]
pub struct SessionStore {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write() = None;
    }
}

impl CredentialProvider for SessionStore {
    fn current_token(&self) -> Option<String> {
        self.token.read().clone()
    }
}
