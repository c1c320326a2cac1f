//! Password hashing for djutils.
//!
//! Three backends are provided (Argon2, bcrypt, PBKDF2). All hashing
//! operations are async and hand the CPU-bound work to
//! `tokio::task::spawn_blocking`.
//!
//! # Hashers
//!
//! - [`Argon2Hasher`] - Primary hasher using Argon2id (recommended)
//! - [`BcryptHasher`] - Fallback using bcrypt
//! - [`Pbkdf2Hasher`] - Legacy support using PBKDF2-HMAC-SHA256

use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use djutils_core::{Settings, UtilsError};

type HmacSha256 = Hmac<Sha256>;

/// Marker prefix for unusable passwords.
const UNUSABLE_PASSWORD_PREFIX: &str = "!";

/// Trait for password hashing backends.
///
/// Hashing and verification are async, using `spawn_blocking` internally
/// for the cryptographic work.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Returns the algorithm identifier (e.g., "argon2", "bcrypt", "`pbkdf2_sha256`").
    fn algorithm(&self) -> &str;

    /// Hashes a password and returns the encoded hash string.
    async fn hash(&self, password: &str) -> Result<String, UtilsError>;

    /// Verifies a password against an encoded hash.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, UtilsError>;

    /// Returns `true` if the hash should be re-hashed (e.g., parameters have changed).
    fn must_update(&self, hash: &str) -> bool;
}

fn join_error(e: &tokio::task::JoinError) -> UtilsError {
    UtilsError::InternalServerError(format!("Task join error: {e}"))
}

/// Argon2id password hasher (primary/recommended).
#[derive(Debug, Clone)]
pub struct Argon2Hasher;

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    fn algorithm(&self) -> &'static str {
        "argon2"
    }

    async fn hash(&self, password: &str) -> Result<String, UtilsError> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            use argon2::password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString};
            use argon2::Argon2;

            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| UtilsError::InternalServerError(format!("Argon2 hash error: {e}")))?;
            Ok(hash.to_string())
        })
        .await
        .map_err(|e| join_error(&e))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, UtilsError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || {
            use argon2::password_hash::{PasswordHash, PasswordVerifier};
            use argon2::Argon2;

            let parsed_hash = PasswordHash::new(&hash)
                .map_err(|e| UtilsError::InternalServerError(format!("Invalid hash: {e}")))?;
            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await
        .map_err(|e| join_error(&e))?
    }

    fn must_update(&self, hash: &str) -> bool {
        !hash.starts_with("$argon2id$")
    }
}

/// Bcrypt password hasher (fallback).
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    /// The bcrypt cost parameter (default: 12).
    pub cost: u32,
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self { cost: 12 }
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    fn algorithm(&self) -> &'static str {
        "bcrypt"
    }

    async fn hash(&self, password: &str) -> Result<String, UtilsError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || {
            bcrypt::hash(password, cost)
                .map_err(|e| UtilsError::InternalServerError(format!("Bcrypt hash error: {e}")))
        })
        .await
        .map_err(|e| join_error(&e))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, UtilsError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || {
            bcrypt::verify(password, &hash)
                .map_err(|e| UtilsError::InternalServerError(format!("Bcrypt verify error: {e}")))
        })
        .await
        .map_err(|e| join_error(&e))?
    }

    fn must_update(&self, hash: &str) -> bool {
        // Cost is encoded in the hash: $2b$XX$...
        hash.strip_prefix("$2b$")
            .and_then(|s| s.get(..2))
            .and_then(|cost| cost.parse::<u32>().ok())
            .is_some_and(|stored_cost| stored_cost < self.cost)
    }
}

/// PBKDF2-HMAC-SHA256 password hasher (legacy support).
///
/// Hashes use the `pbkdf2_sha256$<iterations>$<salt>$<hash>` format.
#[derive(Debug, Clone)]
pub struct Pbkdf2Hasher {
    /// The number of PBKDF2 iterations (default: `600_000`).
    pub iterations: u32,
}

impl Default for Pbkdf2Hasher {
    fn default() -> Self {
        Self {
            iterations: 600_000,
        }
    }
}

#[async_trait]
impl PasswordHasher for Pbkdf2Hasher {
    fn algorithm(&self) -> &'static str {
        "pbkdf2_sha256"
    }

    async fn hash(&self, password: &str) -> Result<String, UtilsError> {
        let password = password.to_string();
        let iterations = self.iterations;
        tokio::task::spawn_blocking(move || {
            use base64::Engine;
            use rand::RngCore;

            let mut salt = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut salt);
            let salt_b64 = base64::engine::general_purpose::STANDARD.encode(salt);

            let mut dk = [0u8; 32];
            pbkdf2_hmac_sha256(password.as_bytes(), salt_b64.as_bytes(), iterations, &mut dk)?;
            let hash_b64 = base64::engine::general_purpose::STANDARD.encode(dk);

            Ok(format!("pbkdf2_sha256${iterations}${salt_b64}${hash_b64}"))
        })
        .await
        .map_err(|e| join_error(&e))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, UtilsError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || {
            use base64::Engine;

            let parts: Vec<&str> = hash.splitn(4, '$').collect();
            if parts.len() != 4 || parts[0] != "pbkdf2_sha256" {
                return Ok(false);
            }

            let iterations: u32 = parts[1].parse().map_err(|_| {
                UtilsError::InternalServerError("Invalid iterations in hash".to_string())
            })?;

            let mut dk = [0u8; 32];
            pbkdf2_hmac_sha256(password.as_bytes(), parts[2].as_bytes(), iterations, &mut dk)?;
            let computed = base64::engine::general_purpose::STANDARD.encode(dk);

            Ok(constant_time_eq(computed.as_bytes(), parts[3].as_bytes()))
        })
        .await
        .map_err(|e| join_error(&e))?
    }

    fn must_update(&self, hash: &str) -> bool {
        hash.strip_prefix("pbkdf2_sha256$")
            .and_then(|s| s.split('$').next())
            .and_then(|iterations| iterations.parse::<u32>().ok())
            .is_some_and(|stored| stored < self.iterations)
    }
}

fn new_mac(key: &[u8]) -> Result<HmacSha256, UtilsError> {
    <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| UtilsError::InternalServerError(format!("HMAC key error: {e}")))
}

/// PBKDF2 with HMAC-SHA256 as the PRF.
fn pbkdf2_hmac_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output: &mut [u8],
) -> Result<(), UtilsError> {
    const H_LEN: usize = 32;

    for (block_idx, chunk) in (1_u32..).zip(output.chunks_mut(H_LEN)) {
        // U_1 = PRF(password, salt || INT_32_BE(i))
        let mut mac = new_mac(password)?;
        mac.update(salt);
        mac.update(&block_idx.to_be_bytes());
        let mut prev = mac.finalize().into_bytes();
        let mut result = prev.to_vec();

        for _ in 1..iterations {
            let mut mac = new_mac(password)?;
            mac.update(&prev);
            prev = mac.finalize().into_bytes();
            for (r, u) in result.iter_mut().zip(prev.iter()) {
                *r ^= u;
            }
        }

        let len = chunk.len();
        chunk.copy_from_slice(&result[..len]);
    }
    Ok(())
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Returns the default list of password hashers.
///
/// The first hasher in the list is used for new passwords. Others are
/// tried during verification.
pub fn default_hashers() -> Vec<Box<dyn PasswordHasher>> {
    vec![
        Box::new(Argon2Hasher),
        Box::new(BcryptHasher::default()),
        Box::new(Pbkdf2Hasher::default()),
    ]
}

/// Returns the hasher registered under `algorithm`, as named in settings.
pub fn hasher_for_algorithm(algorithm: &str) -> Option<Box<dyn PasswordHasher>> {
    default_hashers()
        .into_iter()
        .find(|h| h.algorithm() == algorithm)
}

/// Returns the hasher named by `settings.password_hasher`.
///
/// # Errors
///
/// Returns [`UtilsError::ImproperlyConfigured`] for an unknown algorithm.
pub fn preferred_hasher(settings: &Settings) -> Result<Arc<dyn PasswordHasher>, UtilsError> {
    hasher_for_algorithm(&settings.password_hasher)
        .map(Arc::from)
        .ok_or_else(|| {
            UtilsError::ImproperlyConfigured(format!(
                "Unknown password_hasher {:?}; expected argon2, bcrypt or pbkdf2_sha256.",
                settings.password_hasher
            ))
        })
}

/// Identifies the hasher that produced an encoded hash.
///
/// Returns `None` when `encoded` is not a recognised hash, which includes
/// plain text and unusable (`!`-prefixed) passwords.
///
/// # Examples
///
/// ```
/// use djutils_auth::hashers::identify_hasher;
///
/// assert!(identify_hasher("pbkdf2_sha256$1000$salt$hash").is_some());
/// assert!(identify_hasher("correct horse battery staple").is_none());
/// ```
pub fn identify_hasher(encoded: &str) -> Option<Box<dyn PasswordHasher>> {
    if encoded.starts_with("$argon2") {
        Some(Box::new(Argon2Hasher))
    } else if encoded.starts_with("$2b$") || encoded.starts_with("$2a$") || encoded.starts_with("$2y$") {
        Some(Box::new(BcryptHasher::default()))
    } else if encoded.starts_with("pbkdf2_sha256$") {
        Some(Box::new(Pbkdf2Hasher::default()))
    } else {
        None
    }
}

/// Hashes a password using the preferred (first) hasher.
pub async fn make_password(password: &str) -> Result<String, UtilsError> {
    Argon2Hasher.hash(password).await
}

/// Hashes a password with the hasher selected in `settings`.
pub async fn make_password_with_settings(
    password: &str,
    settings: &Settings,
) -> Result<String, UtilsError> {
    preferred_hasher(settings)?.hash(password).await
}

/// Checks a password against an encoded hash.
///
/// The hasher is identified from the hash format. Returns `false` for
/// unusable password hashes and for values no hasher recognises.
pub async fn check_password(password: &str, hash: &str) -> Result<bool, UtilsError> {
    if !is_password_usable(hash) {
        return Ok(false);
    }

    let Some(hasher) = identify_hasher(hash) else {
        tracing::debug!("stored password is not a recognised hash");
        return Ok(false);
    };

    hasher.verify(password, hash).await
}

/// Returns `true` if the encoded hash represents a usable password.
///
/// Passwords prefixed with `!` (or empty) are unusable.
pub fn is_password_usable(hash: &str) -> bool {
    !hash.is_empty() && !hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
}
