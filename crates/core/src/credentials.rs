//! In-memory holder for the session's bearer token.
//!
//! Each workflow instance owns its own store; there is no process-wide
//! "current token". A fresh process always starts unauthenticated.

use crate::types::BearerToken;

#[derive(Debug, Default)]
pub struct CredentialStore {
    token: Option<BearerToken>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current token.
    pub fn set_token(&mut self, token: BearerToken) {
        self.token = Some(token);
    }

    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    pub fn clear(&mut self) {
        self.token = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
