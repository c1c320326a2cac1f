//! The principal type authenticated by djutils.
//!
//! Password hashing and verification are async and run on the blocking pool.

use serde::{Deserialize, Serialize};

use djutils_core::UtilsError;

/// An account that can log in and be authenticated by token.
///
/// The `password` field always holds an encoded hash (or an unusable
/// `!`-prefixed marker), never the raw password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier. Tokens carry it in its string form.
    pub id: i64,
    /// The user's unique username.
    pub username: String,
    /// The user's email address.
    pub email: String,
    /// The hashed password.
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Inactive accounts cannot log in or authenticate.
    pub is_active: bool,
}

impl User {
    /// Creates an active user with no usable password.
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: String::new(),
            password: String::new(),
            is_active: true,
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Marks the user inactive.
    #[must_use]
    pub const fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// The identifier as signed into tokens.
    pub fn identifier(&self) -> String {
        self.id.to_string()
    }

    /// Hashes and stores `raw_password` with the preferred hasher.
    pub async fn set_password(&mut self, raw_password: &str) -> Result<(), UtilsError> {
        self.password = crate::hashers::make_password(raw_password).await?;
        Ok(())
    }

    /// Checks `raw_password` against the stored hash.
    ///
    /// Returns `false` if the password is unusable.
    pub async fn check_password(&self, raw_password: &str) -> Result<bool, UtilsError> {
        crate::hashers::check_password(raw_password, &self.password).await
    }

    /// Replaces the password with an unusable marker.
    pub fn set_unusable_password(&mut self) {
        use rand::RngCore;
        use std::fmt::Write;
        let mut bytes = [0u8; 20];
        rand::thread_rng().fill_bytes(&mut bytes);
        let random: String = bytes.iter().fold(String::with_capacity(40), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        });
        self.password = format!("!{random}");
    }

    /// Returns `true` if this user has a usable password.
    pub fn has_usable_password(&self) -> bool {
        crate::hashers::is_password_usable(&self.password)
    }
}
