use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::claims::Claims;
use super::verifier::{AuthError, TokenVerifier};

/// Token from `Authorization: Bearer <token>`. The scheme is matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Request gate parameterized by a required role set.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get};
/// use axum_helpers::auth::{PermissionGate, require_permissions};
///
/// let routes = Router::new()
///     .route("/events", get(list_events))
///     .layer(axum::middleware::from_fn_with_state(
///         PermissionGate::authenticated(verifier.clone()),
///         require_permissions,
///     ));
/// ```
#[derive(Clone)]
pub struct PermissionGate {
    verifier: Arc<TokenVerifier>,
    required: Arc<[String]>,
}

impl PermissionGate {
    /// Any valid token passes.
    pub fn authenticated(verifier: Arc<TokenVerifier>) -> Self {
        Self {
            verifier,
            required: Arc::from([]),
        }
    }

    /// Every role in `roles` must be granted.
    pub fn require<I, R>(verifier: Arc<TokenVerifier>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            verifier,
            required: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required_roles(&self) -> &[String] {
        &self.required
    }

    pub async fn check(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token = extract_bearer_token(headers).ok_or(AuthError::MissingToken)?;
        self.verifier.authorize(token, &self.required).await
    }
}

/// Rejects the request unless the gate passes; on success inserts [`Claims`] into the
/// request extensions for handlers to read with `Extension<Claims>`.
pub async fn require_permissions(
    State(gate): State<PermissionGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = gate.check(request.headers()).await.inspect_err(|e| {
        tracing::debug!(error = %e, path = %request.uri().path(), "Permission check failed");
    })?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Raw bearer token, for handlers that forward it to the identity provider.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_bearer_token(&parts.headers)
            .map(|token| BearerToken(token.to_string()))
            .ok_or(AuthError::MissingToken)
    }
}
