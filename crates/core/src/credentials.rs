//! Per-user API credentials and the ring that holds them.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::permissions::{self, Permission};

/// Maximum number of credentials a single user may store.
pub const MAX_KEYS: usize = 15;

/// A validated API key together with what the publisher told us about it.
///
/// Immutable once stored: a changed key is removed and re-added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub account_name: String,
    /// Name the user gave the key on the publisher's site.
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Credential {
    pub fn has_all(&self, required: &[Permission]) -> bool {
        self.missing(required).is_empty()
    }

    pub fn missing(&self, required: &[Permission]) -> Vec<Permission> {
        permissions::missing(&self.permissions, required)
    }

    /// Token with all but the first and last groups masked, for display.
    pub fn masked_token(&self) -> String {
        match (self.token.split('-').next(), self.token.rsplit('-').next()) {
            (Some(first), Some(last)) if self.token.contains('-') => {
                format!("{first}-…-{last}")
            }
            _ => "…".to_string(),
        }
    }
}

/// Whether `token` has the shape of a publisher API key.
///
/// Checked before any network call so obvious typos never reach upstream.
pub fn looks_like_api_key(token: &str) -> bool {
    static KEY_RE: OnceLock<Regex> = OnceLock::new();
    let re = KEY_RE.get_or_init(|| {
        Regex::new(
            r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{20}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
        )
        .expect("static key pattern is valid")
    });
    re.is_match(token.trim())
}

/// Errors from mutating a [`KeyRing`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyRingError {
    #[error("You can't have more than {MAX_KEYS} keys stored.")]
    Full,

    #[error("You have already added this key before.")]
    Duplicate,

    #[error("There is no key number {0}.")]
    NoSuchIndex(usize),
}

/// A user's ordered credentials plus the designated active one.
///
/// Invariants: at most [`MAX_KEYS`] entries, no duplicate tokens, and the
/// active token (if any) is one of the stored credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRing {
    keys: Vec<Credential>,
    active: Option<String>,
}

impl KeyRing {
    /// Rebuild a ring from stored parts, repairing anything that violates
    /// the invariants (older records may be inconsistent).
    pub fn from_parts(keys: Vec<Credential>, active: Option<String>) -> Self {
        let mut deduped: Vec<Credential> = Vec::with_capacity(keys.len());
        for key in keys {
            if deduped.len() == MAX_KEYS {
                break;
            }
            if !deduped.iter().any(|k| k.token == key.token) {
                deduped.push(key);
            }
        }
        let active = active
            .filter(|token| deduped.iter().any(|k| &k.token == token))
            .or_else(|| deduped.first().map(|k| k.token.clone()));
        Self {
            keys: deduped,
            active,
        }
    }

    pub fn into_parts(self) -> (Vec<Credential>, Option<String>) {
        (self.keys, self.active)
    }

    pub fn keys(&self) -> &[Credential] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn active(&self) -> Option<&Credential> {
        let token = self.active.as_deref()?;
        self.keys.iter().find(|k| k.token == token)
    }

    /// Store a new credential and make it the active one.
    pub fn add(&mut self, credential: Credential) -> Result<(), KeyRingError> {
        if self.keys.iter().any(|k| k.token == credential.token) {
            return Err(KeyRingError::Duplicate);
        }
        if self.keys.len() >= MAX_KEYS {
            return Err(KeyRingError::Full);
        }
        self.active = Some(credential.token.clone());
        self.keys.push(credential);
        Ok(())
    }

    /// Remove the credential at zero-based `index`.
    ///
    /// Removing the active credential promotes the first remaining one.
    pub fn remove(&mut self, index: usize) -> Result<Credential, KeyRingError> {
        if index >= self.keys.len() {
            return Err(KeyRingError::NoSuchIndex(index + 1));
        }
        let removed = self.keys.remove(index);
        if self.active.as_deref() == Some(removed.token.as_str()) {
            self.active = self.keys.first().map(|k| k.token.clone());
        }
        Ok(removed)
    }

    /// Make the credential at zero-based `index` the active one.
    pub fn activate(&mut self, index: usize) -> Result<&Credential, KeyRingError> {
        let key = self
            .keys
            .get(index)
            .ok_or(KeyRingError::NoSuchIndex(index + 1))?;
        self.active = Some(key.token.clone());
        Ok(key)
    }

    /// Pick the credential a call on behalf of this user should use.
    pub fn resolve(&self, required: &[Permission]) -> Result<&Credential, ApiError> {
        let key = self.active().ok_or(ApiError::NoCredential)?;
        let missing = key.missing(required);
        if !missing.is_empty() {
            return Err(ApiError::MissingPermissions(missing));
        }
        Ok(key)
    }

    /// Account names across all credentials, deduplicated in ring order.
    pub fn account_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for key in &self.keys {
            if !names.contains(&key.account_name.as_str()) {
                names.push(&key.account_name);
            }
        }
        names
    }
}
