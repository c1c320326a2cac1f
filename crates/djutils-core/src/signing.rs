//! Cryptographic signing for djutils.
//!
//! - [`Signer`]: signs and verifies strings using HMAC-SHA256.
//! - [`TimestampSigner`]: extends [`Signer`] with an embedded timestamp so
//!   signed values can expire.
//!
//! Signed values have the shape `value:signature` (or
//! `value:timestamp:signature` for the timestamp signer). The signature is
//! the unpadded URL-safe base64 encoding of an HMAC-SHA256 keyed with
//! `"<salt>:<secret>"`, so signers sharing a secret but using different salts
//! never accept each other's values.
//!
//! The secret is always handed to the constructor. Nothing here reads global
//! configuration.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::SigningError;
use crate::settings::{TokenAuthSettings, DEFAULT_TOKEN_SALT};

type HmacSha256 = Hmac<Sha256>;

/// The separator used between value and signature.
const DEFAULT_SEP: &str = ":";

// ============================================================
// Signer
// ============================================================

/// Signs and verifies strings using HMAC-SHA256.
///
/// # Examples
///
/// ```
/// use djutils_core::signing::Signer;
///
/// let signer = Signer::new("my-secret-key");
/// let signed = signer.sign("hello");
/// assert_eq!(signer.unsign(&signed).unwrap(), "hello");
/// ```
#[derive(Clone)]
pub struct Signer {
    key: String,
    sep: String,
    salt: String,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("key", &"<redacted>")
            .field("sep", &self.sep)
            .field("salt", &self.salt)
            .finish()
    }
}

impl Signer {
    /// Creates a new `Signer` with the given secret key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sep: DEFAULT_SEP.to_string(),
            salt: "djutils.signing.Signer".to_string(),
        }
    }

    /// Sets the separator between value and signature.
    #[must_use]
    pub fn with_sep(mut self, sep: impl Into<String>) -> Self {
        self.sep = sep.into();
        self
    }

    /// Sets the salt for the HMAC.
    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = salt.into();
        self
    }

    /// Returns the salt.
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Returns the separator.
    pub fn sep(&self) -> &str {
        &self.sep
    }

    /// Computes the signature for a value.
    pub fn signature(&self, value: &str) -> String {
        let salted_key = format!("{}:{}", self.salt, self.key);
        let mut mac =
            HmacSha256::new_from_slice(salted_key.as_bytes()).expect("HMAC accepts any key size");
        mac.update(value.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Signs a value, returning `"value:signature"`.
    pub fn sign(&self, value: &str) -> String {
        format!("{}{}{}", value, self.sep, self.signature(value))
    }

    /// Verifies and returns the original value from a signed string.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::BadSignature`] if there is no separator or the
    /// signature does not match.
    pub fn unsign(&self, signed_value: &str) -> Result<String, SigningError> {
        let (value, sig) = signed_value.rsplit_once(&self.sep).ok_or_else(|| {
            SigningError::BadSignature(format!("No \"{}\" found in value", self.sep))
        })?;

        if constant_time_eq(sig, &self.signature(value)) {
            Ok(value.to_string())
        } else {
            Err(SigningError::BadSignature(format!(
                "Signature \"{sig}\" does not match"
            )))
        }
    }
}

// ============================================================
// TimestampSigner
// ============================================================

/// Signs and verifies strings with embedded timestamps.
///
/// # Examples
///
/// ```
/// use djutils_core::signing::TimestampSigner;
///
/// let signer = TimestampSigner::new("my-secret-key").with_salt("invites");
/// let signed = signer.sign("42");
/// assert_eq!(signer.unsign(&signed, Some(60)).unwrap(), "42");
/// ```
#[derive(Debug, Clone)]
pub struct TimestampSigner {
    signer: Signer,
}

impl TimestampSigner {
    /// Creates a new `TimestampSigner` with the given secret key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            signer: Signer::new(key).with_salt("djutils.signing.TimestampSigner"),
        }
    }

    /// Sets the salt for the HMAC.
    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.signer = self.signer.with_salt(salt);
        self
    }

    /// Sets the separator between value, timestamp and signature.
    #[must_use]
    pub fn with_sep(mut self, sep: impl Into<String>) -> Self {
        self.signer = self.signer.with_sep(sep);
        self
    }

    /// Returns the salt.
    pub fn salt(&self) -> &str {
        self.signer.salt()
    }

    /// Signs a value with the current time embedded.
    ///
    /// Format: `"value:timestamp:signature"`.
    pub fn sign(&self, value: &str) -> String {
        self.sign_at(value, now_timestamp())
    }

    /// Signs a value as if the clock read `timestamp` seconds since the epoch.
    pub fn sign_at(&self, value: &str, timestamp: u64) -> String {
        let value_with_ts = format!("{}{}{}", value, self.signer.sep, base62_encode(timestamp));
        self.signer.sign(&value_with_ts)
    }

    /// Verifies and returns the original value from a timestamp-signed string.
    ///
    /// When `max_age` is `Some(seconds)` the value is rejected once more than
    /// `seconds` have elapsed since signing.
    ///
    /// # Errors
    ///
    /// [`SigningError::BadSignature`] for malformed or tampered values,
    /// [`SigningError::SignatureExpired`] for values that are too old.
    pub fn unsign(&self, signed_value: &str, max_age: Option<u64>) -> Result<String, SigningError> {
        self.unsign_at(signed_value, max_age, now_timestamp())
    }

    /// Like [`unsign`](Self::unsign), evaluated at the clock reading `now`.
    pub fn unsign_at(
        &self,
        signed_value: &str,
        max_age: Option<u64>,
        now: u64,
    ) -> Result<String, SigningError> {
        let value_with_ts = self.signer.unsign(signed_value)?;

        let (value, timestamp_str) = value_with_ts
            .rsplit_once(&self.signer.sep)
            .ok_or_else(|| SigningError::BadSignature("No timestamp found".to_string()))?;

        let timestamp = base62_decode(timestamp_str)?;

        if let Some(max_age) = max_age {
            let age = now.saturating_sub(timestamp);
            if age > max_age {
                return Err(SigningError::SignatureExpired { age, max_age });
            }
        }

        Ok(value.to_string())
    }
}

/// Returns the signer used for stateless authentication tokens.
///
/// The salt is fixed to `"stateless_auth_token"` so tokens cannot be replayed
/// against other timestamp signers built from the same secret.
pub fn stateless_auth_token_signer(secret: impl Into<String>) -> TimestampSigner {
    TimestampSigner::new(secret).with_salt(DEFAULT_TOKEN_SALT)
}

/// Returns a token signer whose salt comes from the token settings.
pub fn token_signer_from_settings(secret: impl Into<String>, token: &TokenAuthSettings) -> TimestampSigner {
    TimestampSigner::new(secret).with_salt(token.salt.clone())
}

/// Current time as whole seconds since the Unix epoch.
///
/// A clock set before the epoch reads as zero.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

// ============================================================
// Helpers
// ============================================================

/// Base62 character set (digits + uppercase + lowercase).
const BASE62_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encodes a u64 into a base62 string.
fn base62_encode(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut chars = Vec::new();
    while n > 0 {
        chars.push(char::from(BASE62_CHARS[(n % 62) as usize]));
        n /= 62;
    }
    chars.iter().rev().collect()
}

/// Decodes a base62 string into a u64.
fn base62_decode(s: &str) -> Result<u64, SigningError> {
    if s.is_empty() {
        return Err(SigningError::BadSignature("Empty timestamp".to_string()));
    }
    let mut result: u64 = 0;
    for c in s.bytes() {
        let digit = match c {
            b'0'..=b'9' => u64::from(c - b'0'),
            b'A'..=b'Z' => u64::from(c - b'A') + 10,
            b'a'..=b'z' => u64::from(c - b'a') + 36,
            _ => {
                return Err(SigningError::BadSignature(format!(
                    "Invalid base62 character: {c}"
                )));
            }
        };
        result = result
            .checked_mul(62)
            .and_then(|r| r.checked_add(digit))
            .ok_or_else(|| SigningError::BadSignature("Timestamp overflow".to_string()))?;
    }
    Ok(result)
}

/// Constant-time string comparison.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
