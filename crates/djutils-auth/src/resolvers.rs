//! Resolving a token's identifier to a principal.
//!
//! A token carries one identifier. [`PrincipalResolver`] turns it into an
//! active [`User`], either directly ([`DirectResolver`]) or through an
//! intermediate record owned by a user ([`AssociationResolver`]), e.g. an
//! API application issued to a customer.
//!
//! Stores are traits so the same resolvers work against a database or the
//! in-memory stores provided here.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use djutils_core::UtilsError;

use crate::user::User;

/// Lookup of users.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Returns the user with identifier `id` if it exists and is active.
    async fn lookup_active_principal(&self, id: &str) -> Result<Option<User>, UtilsError>;

    /// Returns the user with the given username, active or not.
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, UtilsError>;
}

/// A record that belongs to exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// The record's own identifier, as carried by tokens.
    pub pk: String,
    /// Identifier of the owning user.
    pub user_id: String,
}

impl Association {
    /// Creates an association from `pk` to the user `user_id`.
    pub fn new(pk: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            user_id: user_id.into(),
        }
    }
}

/// Lookup of association records.
#[async_trait]
pub trait AssociationStore: Send + Sync {
    /// Returns the association with primary key `pk`.
    async fn lookup(&self, pk: &str) -> Result<Option<Association>, UtilsError>;
}

/// Maps a decoded token identifier to an active principal.
///
/// `Ok(None)` means the identifier names nothing usable. `Err` is reserved
/// for store failures.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// Resolves `identifier`.
    async fn resolve(&self, identifier: &str) -> Result<Option<User>, UtilsError>;
}

/// Treats the identifier as a user id.
#[derive(Debug, Clone)]
pub struct DirectResolver<S> {
    users: Arc<S>,
}

impl<S: IdentityStore> DirectResolver<S> {
    /// Creates a resolver over `users`.
    pub const fn new(users: Arc<S>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<S: IdentityStore> PrincipalResolver for DirectResolver<S> {
    async fn resolve(&self, identifier: &str) -> Result<Option<User>, UtilsError> {
        self.users.lookup_active_principal(identifier).await
    }
}

/// Treats the identifier as an association pk and resolves its owner.
///
/// A missing association, a missing owner and an inactive owner all
/// resolve to `None`.
#[derive(Clone)]
pub struct AssociationResolver {
    associations: Arc<dyn AssociationStore>,
    users: Arc<dyn IdentityStore>,
}

impl std::fmt::Debug for AssociationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssociationResolver").finish_non_exhaustive()
    }
}

impl AssociationResolver {
    /// Creates a resolver over the given stores.
    pub fn new(associations: Arc<dyn AssociationStore>, users: Arc<dyn IdentityStore>) -> Self {
        Self {
            associations,
            users,
        }
    }
}

#[async_trait]
impl PrincipalResolver for AssociationResolver {
    async fn resolve(&self, identifier: &str) -> Result<Option<User>, UtilsError> {
        let Some(association) = self.associations.lookup(identifier).await? else {
            return Ok(None);
        };
        self.users
            .lookup_active_principal(&association.user_id)
            .await
    }
}

/// An identity store kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user, replacing any existing user with the same id.
    pub async fn add_user(&self, user: User) {
        let mut users = self.users.write().await;
        users.retain(|u| u.id != user.id);
        users.push(user);
    }

    /// Removes the user with id `id`. Returns `true` if one was removed.
    pub async fn remove_user(&self, id: i64) -> bool {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        users.len() != before
    }

    /// Sets the active flag of the user with id `id`.
    pub async fn set_active(&self, id: i64, active: bool) -> Result<(), UtilsError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| UtilsError::DoesNotExist(format!("User {id} does not exist")))?;
        user.is_active = active;
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for InMemoryUserStore {
    async fn lookup_active_principal(&self, id: &str) -> Result<Option<User>, UtilsError> {
        let Ok(id) = id.parse::<i64>() else {
            return Ok(None);
        };
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id && u.is_active).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, UtilsError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }
}

/// An association store kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryAssociationStore {
    records: RwLock<Vec<Association>>,
}

impl InMemoryAssociationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record, replacing any existing record with the same pk.
    pub async fn add(&self, association: Association) {
        let mut records = self.records.write().await;
        records.retain(|a| a.pk != association.pk);
        records.push(association);
    }
}

#[async_trait]
impl AssociationStore for InMemoryAssociationStore {
    async fn lookup(&self, pk: &str) -> Result<Option<Association>, UtilsError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|a| a.pk == pk).cloned())
    }
}
