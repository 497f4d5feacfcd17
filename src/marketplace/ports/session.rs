//! Ports for the per-request session map and credential checks.

use crate::marketplace::domain::CredentialHash;
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Session key holding the authenticated user's identifier.
pub const USER_ID_KEY: &str = "user_id";

/// Session key holding the authenticated user's role.
pub const ROLE_KEY: &str = "role";

/// Mutable per-request key-value session supplied by the routing layer.
pub trait SessionStore {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<&str>;

    /// Stores `value` under `key`, replacing any previous value.
    fn insert(&mut self, key: &str, value: String);

    /// Removes every entry.
    fn clear(&mut self);
}

impl<S: BuildHasher> SessionStore for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<&str> {
        Self::get(self, key).map(String::as_str)
    }

    fn insert(&mut self, key: &str, value: String) {
        Self::insert(self, key.to_owned(), value);
    }

    fn clear(&mut self) {
        Self::clear(self);
    }
}

/// Checks a plaintext password against a stored hash. Hashing itself is
/// performed outside the marketplace.
pub trait CredentialVerifier: Send + Sync {
    /// Returns `true` when `password` matches `hash`.
    fn verify(&self, password: &str, hash: &CredentialHash) -> bool;
}
