//! The token-issuing endpoint.
//!
//! [`ObtainStatelessAuthToken`] exchanges a username and password for a
//! signed token. Credential checking is delegated to a
//! [`CredentialValidator`]; [`AuthTokenSerializer`] is the default and
//! authenticates against the configured [`AuthBackend`]s.
//!
//! Issuing a token writes nothing: the token is the signed user identifier.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::response::IntoResponse;
use axum::routing::any;
use http::{Method, Request, StatusCode};

use djutils_core::signing::TimestampSigner;
use djutils_core::{UtilsError, ValidationError};
use djutils_http::{HttpRequest, HttpResponse, JsonResponse};

use crate::backends::{authenticate, AuthBackend, Credentials};
use crate::token::StatelessTokenAuthentication;
use crate::user::User;

/// Largest request body the router reads.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Validates the credentials carried by a token request.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Returns the user the request proves to be.
    ///
    /// Rejected credentials are reported as [`UtilsError::ValidationError`],
    /// whose field errors become the body of the `400` response. Any other
    /// error is a server-side failure.
    async fn validate(&self, request: &HttpRequest) -> Result<User, UtilsError>;
}

/// Reads `username` and `password` from the body and authenticates them.
///
/// JSON bodies and `application/x-www-form-urlencoded` bodies are accepted.
pub struct AuthTokenSerializer {
    backends: Vec<Arc<dyn AuthBackend>>,
}

impl std::fmt::Debug for AuthTokenSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokenSerializer")
            .field("backends", &self.backends.len())
            .finish()
    }
}

impl AuthTokenSerializer {
    /// Creates a serializer that tries `backends` in order.
    pub fn new(backends: Vec<Arc<dyn AuthBackend>>) -> Self {
        Self { backends }
    }

    fn read_credentials(request: &HttpRequest) -> Result<Credentials, UtilsError> {
        let json = if request.is_json() {
            Some(request.json::<serde_json::Value>()?)
        } else {
            None
        };

        let mut errors = ValidationError::new("", "invalid");
        let mut field = |name: &str| -> Option<String> {
            let value = match &json {
                Some(body) => match body.get(name) {
                    None | Some(serde_json::Value::Null) => None,
                    Some(serde_json::Value::String(s)) => Some(s.clone()),
                    Some(_) => {
                        errors.add_field_error(
                            name,
                            ValidationError::new("Not a valid string.", "invalid"),
                        );
                        return None;
                    }
                },
                None => request.form_value(name).map(String::from),
            };
            match value {
                None => {
                    errors.add_field_error(
                        name,
                        ValidationError::new("This field is required.", "required"),
                    );
                    None
                }
                Some(v) if v.is_empty() => {
                    errors.add_field_error(
                        name,
                        ValidationError::new("This field may not be blank.", "blank"),
                    );
                    None
                }
                Some(v) => Some(v),
            }
        };

        let username = field("username");
        let password = field("password");
        match (username, password) {
            (Some(username), Some(password)) => Ok(Credentials::new(username, password)),
            _ => Err(errors.into()),
        }
    }
}

#[async_trait]
impl CredentialValidator for AuthTokenSerializer {
    async fn validate(&self, request: &HttpRequest) -> Result<User, UtilsError> {
        let credentials = Self::read_credentials(request)?;
        match authenticate(&credentials, &self.backends).await? {
            Some(user) if user.is_active => Ok(user),
            _ => {
                tracing::debug!(username = %credentials.username, "token request rejected");
                Err(ValidationError::new(
                    "Unable to log in with provided credentials.",
                    "authorization",
                )
                .into())
            }
        }
    }
}

/// Issues a stateless token to a user proving their credentials.
///
/// Responds `200 {"token": "<signed>"}` on success and
/// `400 {field: [messages]}` when validation fails. Only POST is allowed.
pub struct ObtainStatelessAuthToken {
    signer: TimestampSigner,
    validator: Arc<dyn CredentialValidator>,
}

impl std::fmt::Debug for ObtainStatelessAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObtainStatelessAuthToken")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

impl ObtainStatelessAuthToken {
    /// Creates the view. `signer` must be the one the authenticator verifies with.
    pub fn new(signer: TimestampSigner, validator: Arc<dyn CredentialValidator>) -> Self {
        Self { signer, validator }
    }

    /// Creates the view sharing `auth`'s signer.
    pub fn for_authenticator(
        auth: &StatelessTokenAuthentication,
        validator: Arc<dyn CredentialValidator>,
    ) -> Self {
        Self::new(auth.signer().clone(), validator)
    }

    /// Routes the request by method.
    pub async fn dispatch(&self, request: &HttpRequest) -> HttpResponse {
        if request.method() == Method::POST {
            self.post(request).await
        } else {
            HttpResponse::not_allowed(&["POST"])
        }
    }

    /// Validates the credentials and responds with a token.
    pub async fn post(&self, request: &HttpRequest) -> HttpResponse {
        match self.validator.validate(request).await {
            Ok(user) => {
                let token = self.signer.sign(&user.identifier());
                tracing::info!(user_id = user.id, "issued stateless auth token");
                JsonResponse::new(&serde_json::json!({ "token": token }))
            }
            Err(UtilsError::ValidationError(err)) => {
                JsonResponse::with_status(StatusCode::BAD_REQUEST, &err.message_dict())
            }
            Err(err) => {
                tracing::error!(error = %err, "token request failed");
                HttpResponse::from_error(&err)
            }
        }
    }
}

/// Mounts `view` at `/` on a router.
pub fn token_router(view: Arc<ObtainStatelessAuthToken>) -> axum::Router {
    let handler = move |req: Request<Body>| {
        let view = view.clone();
        async move {
            let (parts, body) = req.into_parts();
            let Ok(body) = axum::body::to_bytes(body, MAX_BODY_BYTES).await else {
                return HttpResponse::bad_request("Request body too large").into_response();
            };
            let request = HttpRequest::from_axum(parts, body.to_vec());
            view.dispatch(&request).await.into_response()
        }
    };
    axum::Router::new().route("/", any(handler))
}
