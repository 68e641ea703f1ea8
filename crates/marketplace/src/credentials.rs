//! Password hashing and session token seams.
//!
//! Account use-cases depend only on the two traits here. The provided
//! implementations hash with Argon2id and keep opaque tokens in memory.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use argon2::Argon2;
use argon2::password_hash::{self, PasswordHash, SaltString, rand_core::OsRng};
use chrono::{DateTime, Duration, Utc};
use common::UserId;
use domain::{Clock, Role};
use uuid::Uuid;

use crate::error::CredentialError;

/// Hashes and checks passwords.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, CredentialError>;

    /// Returns `Ok(false)` on a wrong password; `Err` only when `hash`
    /// cannot be parsed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError>;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        use password_hash::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| CredentialError::Hash)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        use password_hash::PasswordVerifier as _;

        let parsed = PasswordHash::new(hash).map_err(|_| CredentialError::MalformedHash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    Access,
    Refresh,
    EmailVerification,
    PasswordReset,
}

/// Claims carried by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: UserId,
    pub role: Role,
    pub purpose: TokenPurpose,
}

/// Issues and verifies session tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, claims: TokenClaims, ttl: Duration) -> String;

    /// Returns the claims if `token` exists, has not expired and was issued
    /// for `purpose`.
    fn verify(&self, token: &str, purpose: TokenPurpose) -> Option<TokenClaims>;

    /// Like [`TokenIssuer::verify`], but a valid token is removed so it
    /// cannot be presented again. Wrong-purpose tokens are left in place.
    fn consume(&self, token: &str, purpose: TokenPurpose) -> Option<TokenClaims>;

    /// Forgets every expired token and returns how many were dropped.
    fn purge_expired(&self) -> usize;
}

#[derive(Debug, Clone)]
struct IssuedToken {
    claims: TokenClaims,
    expires_at: DateTime<Utc>,
}

/// Opaque random tokens kept in process memory.
#[derive(Clone)]
pub struct InMemoryTokenIssuer {
    clock: Arc<dyn Clock>,
    tokens: Arc<RwLock<HashMap<String, IssuedToken>>>,
}

impl InMemoryTokenIssuer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            tokens: Arc::default(),
        }
    }
}

impl TokenIssuer for InMemoryTokenIssuer {
    fn issue(&self, claims: TokenClaims, ttl: Duration) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let issued = IssuedToken {
            claims,
            expires_at: self.clock.now() + ttl,
        };
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), issued);
        token
    }

    fn verify(&self, token: &str, purpose: TokenPurpose) -> Option<TokenClaims> {
        let tokens = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
        let issued = tokens.get(token)?;
        (issued.claims.purpose == purpose && self.clock.now() < issued.expires_at)
            .then_some(issued.claims)
    }

    fn consume(&self, token: &str, purpose: TokenPurpose) -> Option<TokenClaims> {
        let now = self.clock.now();
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        let issued = tokens.get(token)?;
        if issued.claims.purpose != purpose || now >= issued.expires_at {
            return None;
        }
        tokens.remove(token).map(|issued| issued.claims)
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        let before = tokens.len();
        tokens.retain(|_, issued| now < issued.expires_at);
        before - tokens.len()
    }
}
