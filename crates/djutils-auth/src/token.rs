//! Stateless signed-token authentication.
//!
//! A token is a signed, timestamped identifier
//! (`"<identifier>:<timestamp>:<signature>"`). Nothing is stored server
//! side: [`StatelessTokenAuthentication`] verifies the signature and age of
//! the token presented in the `Authorization` header, then resolves the
//! identifier to an active [`User`] through a [`PrincipalResolver`].
//!
//! The header looks like `Authorization: Token <token>`. The keyword is
//! configurable and matched case-insensitively.

use std::sync::Arc;

use http::StatusCode;
use thiserror::Error;

use djutils_core::settings::{TokenAuthSettings, DEFAULT_TOKEN_MAX_AGE, DEFAULT_TOKEN_SALT};
use djutils_core::signing::TimestampSigner;
use djutils_core::{Settings, UtilsError};
use djutils_http::{HttpRequest, HttpResponse, JsonResponse};

use crate::resolvers::PrincipalResolver;
use crate::user::User;

/// Why a request failed token authentication.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The header holds the keyword but no token.
    #[error("Invalid token header. No credentials provided.")]
    NoCredentials,

    /// The header holds more than one token-like part.
    #[error("Invalid token header. Token string should not contain spaces.")]
    TokenContainsSpaces,

    /// The token is not valid UTF-8.
    #[error("Invalid token header. Token string should not contain invalid characters.")]
    InvalidCharacters,

    /// The token is forged, tampered with, expired, or names no active user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A store failed while resolving the principal.
    #[error(transparent)]
    Backend(#[from] UtilsError),
}

impl AuthError {
    /// Returns the HTTP status code for this failure.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Backend(err) => err.status_code(),
            _ => 401,
        }
    }

    /// Builds the error response.
    ///
    /// Credential failures become `401` with `{"detail": message}` and a
    /// `WWW-Authenticate: <keyword>` challenge. Backend failures keep their
    /// own status.
    pub fn to_response(&self, challenge: &str) -> HttpResponse {
        match self {
            Self::Backend(err) => HttpResponse::from_error(err),
            _ => {
                let body = serde_json::json!({ "detail": self.to_string() });
                let mut response = JsonResponse::with_status(StatusCode::UNAUTHORIZED, &body);
                if let Ok(value) = http::HeaderValue::from_str(challenge) {
                    response
                        .headers_mut()
                        .insert(http::header::WWW_AUTHENTICATE, value);
                }
                response
            }
        }
    }
}

/// Options for [`StatelessTokenAuthentication`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAuthConfig {
    /// `Authorization` header keyword.
    pub keyword: String,
    /// Maximum token age in seconds.
    pub max_age: u64,
    /// Salt namespacing token signatures.
    pub salt: String,
}

impl Default for TokenAuthConfig {
    fn default() -> Self {
        Self {
            keyword: "Token".to_string(),
            max_age: DEFAULT_TOKEN_MAX_AGE,
            salt: DEFAULT_TOKEN_SALT.to_string(),
        }
    }
}

impl From<&TokenAuthSettings> for TokenAuthConfig {
    fn from(settings: &TokenAuthSettings) -> Self {
        Self {
            keyword: settings.keyword.clone(),
            max_age: settings.max_age,
            salt: settings.salt.clone(),
        }
    }
}

/// A successfully authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    /// The resolved principal.
    pub user: User,
    /// The token that was presented.
    pub token: String,
}

/// Authenticates requests carrying a stateless signed token.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use djutils_auth::resolvers::{DirectResolver, InMemoryUserStore};
/// use djutils_auth::token::{StatelessTokenAuthentication, TokenAuthConfig};
///
/// let users = Arc::new(InMemoryUserStore::new());
/// let auth = StatelessTokenAuthentication::new(
///     "secret",
///     TokenAuthConfig::default(),
///     Arc::new(DirectResolver::new(users)),
/// );
/// assert_eq!(auth.authenticate_header(), "Token");
/// ```
#[derive(Clone)]
pub struct StatelessTokenAuthentication {
    signer: TimestampSigner,
    config: TokenAuthConfig,
    resolver: Arc<dyn PrincipalResolver>,
}

impl std::fmt::Debug for StatelessTokenAuthentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatelessTokenAuthentication")
            .field("signer", &self.signer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StatelessTokenAuthentication {
    /// Creates an authenticator signing with `secret`.
    pub fn new(
        secret: impl Into<String>,
        config: TokenAuthConfig,
        resolver: Arc<dyn PrincipalResolver>,
    ) -> Self {
        let signer = TimestampSigner::new(secret).with_salt(config.salt.clone());
        Self {
            signer,
            config,
            resolver,
        }
    }

    /// Creates an authenticator from validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`UtilsError::ImproperlyConfigured`] if the settings do not
    /// validate.
    pub fn from_settings(
        settings: &Settings,
        resolver: Arc<dyn PrincipalResolver>,
    ) -> Result<Self, UtilsError> {
        settings.validate()?;
        Ok(Self::new(
            settings.secret_key.clone(),
            TokenAuthConfig::from(&settings.token_auth),
            resolver,
        ))
    }

    /// The keyword sent back in `WWW-Authenticate` on `401` responses.
    pub fn authenticate_header(&self) -> &str {
        &self.config.keyword
    }

    /// Returns the configuration.
    pub const fn config(&self) -> &TokenAuthConfig {
        &self.config
    }

    /// Returns the signer shared with the token endpoint.
    pub const fn signer(&self) -> &TimestampSigner {
        &self.signer
    }

    /// Mints a token for `identifier` (a user id or an association pk).
    pub fn issue_token(&self, identifier: &str) -> String {
        self.signer.sign(identifier)
    }

    /// Authenticates a request.
    ///
    /// Returns `Ok(None)` when the request carries no token for this scheme,
    /// so another scheme may try it.
    pub async fn authenticate(
        &self,
        request: &HttpRequest,
    ) -> Result<Option<Authenticated>, AuthError> {
        self.authenticate_authorization(request.authorization_header())
            .await
    }

    /// Authenticates a raw `Authorization` header value.
    pub async fn authenticate_authorization(
        &self,
        header: Option<&[u8]>,
    ) -> Result<Option<Authenticated>, AuthError> {
        let Some(token) = self.extract_token(header.unwrap_or_default())? else {
            return Ok(None);
        };
        let user = self.authenticate_credentials(&token).await?;
        Ok(Some(Authenticated { user, token }))
    }

    /// Verifies `token` and resolves its principal.
    pub async fn authenticate_credentials(&self, token: &str) -> Result<User, AuthError> {
        let identifier = self
            .signer
            .unsign(token, Some(self.config.max_age))
            .map_err(|err| {
                tracing::debug!(reason = %err, "token rejected by signer");
                AuthError::InvalidCredentials
            })?;

        match self.resolver.resolve(&identifier).await {
            Ok(Some(user)) if user.is_active => Ok(user),
            Ok(_) => {
                tracing::debug!(identifier = %identifier, "token principal missing or inactive");
                Err(AuthError::InvalidCredentials)
            }
            Err(err) => {
                tracing::debug!(error = %err, "principal lookup failed");
                Err(AuthError::Backend(err))
            }
        }
    }

    /// Splits the header into keyword and token.
    fn extract_token(&self, header: &[u8]) -> Result<Option<String>, AuthError> {
        let parts: Vec<&[u8]> = header
            .split(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c'))
            .filter(|part| !part.is_empty())
            .collect();

        match parts.as_slice() {
            [] => Ok(None),
            [keyword, ..] if !keyword.eq_ignore_ascii_case(self.config.keyword.as_bytes()) => {
                Ok(None)
            }
            [_] => Err(self.fail(AuthError::NoCredentials)),
            [_, token] => std::str::from_utf8(token)
                .map(|token| Some(token.to_string()))
                .map_err(|_| self.fail(AuthError::InvalidCharacters)),
            _ => Err(self.fail(AuthError::TokenContainsSpaces)),
        }
    }

    fn fail(&self, err: AuthError) -> AuthError {
        tracing::debug!(keyword = %self.config.keyword, reason = %err, "malformed token header");
        err
    }
}
