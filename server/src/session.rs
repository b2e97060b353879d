//! Opaque session tokens.
//!
//! Signup/login live outside this system; all the API needs is a way to
//! turn an opaque token into a user id. Tokens are uuid v4 strings held
//! in memory; the real session issuer replaces this store behind the same
//! three calls.

use crate::ledger::UserId;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct SessionStore {
    tokens: RwLock<HashMap<String, UserId>>,
}

impl SessionStore {
    pub fn issue(&self, user: UserId) -> String {
        let token = Uuid::new_v4().to_string();
        let mut tokens = match self.tokens.write() {
            Ok(tokens) => tokens,
            Err(poisoned) => poisoned.into_inner(),
        };
        tokens.insert(token.clone(), user);
        token
    }

    pub fn resolve(&self, token: &str) -> Option<UserId> {
        let tokens = match self.tokens.read() {
            Ok(tokens) => tokens,
            Err(poisoned) => poisoned.into_inner(),
        };
        tokens.get(token).copied()
    }

    pub fn revoke(&self, token: &str) {
        let mut tokens = match self.tokens.write() {
            Ok(tokens) => tokens,
            Err(poisoned) => poisoned.into_inner(),
        };
        tokens.remove(token);
    }
}
