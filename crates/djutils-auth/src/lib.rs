//! # djutils-auth
//!
//! Authentication for djutils:
//!
//! - **Password hashing** with Argon2, bcrypt, and PBKDF2 backends (`hashers`)
//! - **Hashed model fields** that never store secrets in plain text (`fields`)
//! - **Credential backends** for username/password checks (`backends`)
//! - **Principal resolution** from token identifiers (`resolvers`)
//! - **Stateless signed-token authentication** (`token`)
//! - **The token-issuing endpoint** (`views`)
//!
//! ## Design Principles
//!
//! Tokens are never stored: a token is a user identifier signed with a
//! timestamp, verified by signature and age. Password hashing runs via
//! `tokio::task::spawn_blocking`. All traits are `Send + Sync`.

pub mod backends;
pub mod fields;
pub mod hashers;
pub mod resolvers;
pub mod token;
pub mod user;
pub mod views;

// Re-exports for convenience
pub use backends::{authenticate, AuthBackend, Credentials, ModelBackend};
pub use fields::HashedCharField;
pub use hashers::{
    check_password, identify_hasher, is_password_usable, make_password,
    make_password_with_settings, preferred_hasher, PasswordHasher,
};
pub use resolvers::{
    Association, AssociationResolver, AssociationStore, DirectResolver, IdentityStore,
    InMemoryAssociationStore, InMemoryUserStore, PrincipalResolver,
};
pub use token::{AuthError, Authenticated, StatelessTokenAuthentication, TokenAuthConfig};
pub use user::User;
pub use views::{token_router, AuthTokenSerializer, CredentialValidator, ObtainStatelessAuthToken};
