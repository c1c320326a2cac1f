//! Credential authentication backends.
//!
//! The [`AuthBackend`] trait checks a username/password pair. The token
//! endpoint runs every configured backend through [`authenticate`] and
//! mints a token for the first user accepted.

use std::sync::Arc;

use async_trait::async_trait;

use djutils_core::UtilsError;

use crate::resolvers::IdentityStore;
use crate::user::User;

/// A username and password pair.
#[derive(Clone)]
pub struct Credentials {
    /// The username to authenticate with.
    pub username: String,
    /// The raw password to verify.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

impl Credentials {
    /// Creates credentials with username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Trait for authentication backends.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Attempts to authenticate a user with the given credentials.
    ///
    /// Returns `Ok(Some(user))` on success, `Ok(None)` if the credentials
    /// don't match, or `Err` on backend failure.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<User>, UtilsError>;
}

/// Authenticates against an [`IdentityStore`].
///
/// Inactive users are rejected even when the password matches.
pub struct ModelBackend {
    users: Arc<dyn IdentityStore>,
}

impl std::fmt::Debug for ModelBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBackend").finish_non_exhaustive()
    }
}

impl ModelBackend {
    /// Creates a backend over `users`.
    pub fn new(users: Arc<dyn IdentityStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl AuthBackend for ModelBackend {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<User>, UtilsError> {
        let Some(user) = self.users.get_by_username(&credentials.username).await? else {
            return Ok(None);
        };
        if !user.is_active {
            return Ok(None);
        }
        if user.check_password(&credentials.password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

/// Authenticates a user against a list of backends.
///
/// Tries each backend in order and returns the first user accepted.
pub async fn authenticate(
    credentials: &Credentials,
    backends: &[Arc<dyn AuthBackend>],
) -> Result<Option<User>, UtilsError> {
    for backend in backends {
        if let Some(user) = backend.authenticate(credentials).await? {
            return Ok(Some(user));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashers::{BcryptHasher, PasswordHasher};
    use crate::resolvers::InMemoryUserStore;

    async fn user_with_password(id: i64, username: &str, password: &str) -> User {
        let mut user = User::new(id, username);
        user.password = BcryptHasher { cost: 4 }.hash(password).await.unwrap();
        user
    }

    async fn store() -> Arc<InMemoryUserStore> {
        let store = Arc::new(InMemoryUserStore::new());
        store.add_user(user_with_password(1, "alice", "pw").await).await;
        store
            .add_user(user_with_password(2, "bob", "pw").await.inactive())
            .await;
        store
    }

    struct FixedBackend(Option<User>);

    #[async_trait]
    impl AuthBackend for FixedBackend {
        async fn authenticate(&self, _: &Credentials) -> Result<Option<User>, UtilsError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("alice", "hunter2"));
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_model_backend_success() {
        let backend = ModelBackend::new(store().await);
        let user = backend
            .authenticate(&Credentials::new("alice", "pw"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn test_model_backend_wrong_password() {
        let backend = ModelBackend::new(store().await);
        assert!(backend
            .authenticate(&Credentials::new("alice", "nope"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_model_backend_unknown_and_inactive() {
        let backend = ModelBackend::new(store().await);
        assert!(backend
            .authenticate(&Credentials::new("carol", "pw"))
            .await
            .unwrap()
            .is_none());
        assert!(backend
            .authenticate(&Credentials::new("bob", "pw"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_authenticate_tries_backends_in_order() {
        let backends: Vec<Arc<dyn AuthBackend>> = vec![
            Arc::new(FixedBackend(None)),
            Arc::new(FixedBackend(Some(User::new(5, "second")))),
            Arc::new(FixedBackend(Some(User::new(6, "third")))),
        ];
        let user = authenticate(&Credentials::new("x", "y"), &backends)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "second");
    }

    #[tokio::test]
    async fn test_authenticate_no_backends() {
        assert!(authenticate(&Credentials::new("x", "y"), &[])
            .await
            .unwrap()
            .is_none());
    }
}
