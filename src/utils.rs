use std::sync::atomic::{AtomicI64, Ordering};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::types::PkcePair;

/// Unreserved characters allowed in a PKCE code verifier (RFC 7636 §4.1).
pub const UNRESERVED_CHARS: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

pub const CODE_VERIFIER_LENGTH: usize = 64;
pub const STATE_LENGTH: usize = 16;

/// Draws `length` characters uniformly from [`UNRESERVED_CHARS`].
///
/// Uses the thread-local generator, which is cryptographically secure.
pub fn random_unreserved(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| UNRESERVED_CHARS[rng.random_range(0..UNRESERVED_CHARS.len())] as char)
        .collect()
}

pub fn generate_code_verifier() -> String {
    random_unreserved(CODE_VERIFIER_LENGTH)
}

/// base64url(SHA-256(verifier)) without padding.
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

pub fn generate_pkce_pair() -> PkcePair {
    let code_verifier = generate_code_verifier();
    let code_challenge = generate_code_challenge(&code_verifier);
    PkcePair {
        code_verifier,
        code_challenge,
    }
}

/// Anti-forgery value sent as `state` with the authorize request.
pub fn generate_state() -> String {
    random_unreserved(STATE_LENGTH)
}

/// Normalizes a title or artist name for exact comparison.
///
/// Lower-cases, drops everything that is neither a word character nor
/// whitespace, and collapses whitespace runs into single spaces.
pub fn normalize(value: &str) -> String {
    let cleaned: String = value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.now.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
