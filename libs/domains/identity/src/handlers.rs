use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect},
    routing::{get, post, put},
};
use axum_helpers::{
    BearerToken, PermissionGate, TokenVerifier, ValidatedForm, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, RequestTimeoutResponse,
        UnauthorizedResponse,
    },
    require_permissions,
};
use serde_json::Value;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::IdentityResult;
use crate::models::{
    CallbackQuery, CallbackTokens, Credentials, MessageResponse, TokenPair, TokenRequest,
    UpdatePassword, UserSummary,
};
use crate::provider::IdentityProvider;
use crate::service::AuthService;

const TAG: &str = "auth";

/// Role required for user administration.
pub const ADMIN_ROLE: &str = "admin";

/// OpenAPI documentation for the auth API
#[derive(OpenApi)]
#[openapi(
    paths(
        register, token, refresh, logout, introspect, generate_auth, callback,
        list_users, update_password, delete_user
    ),
    components(
        schemas(
            Credentials, TokenRequest, TokenPair, CallbackTokens, UserSummary,
            UpdatePassword, MessageResponse
        ),
        responses(
            BadRequestValidationResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            ConflictResponse,
            RequestTimeoutResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Registration, tokens and user administration via Keycloak")
    )
)]
pub struct ApiDoc;

/// Public session routes plus `/users` administration gated on [`ADMIN_ROLE`].
pub fn router<P: IdentityProvider + 'static>(
    service: AuthService<P>,
    verifier: Arc<TokenVerifier>,
) -> Router {
    let shared_service = Arc::new(service);

    let admin_routes = Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", put(update_password).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(
            PermissionGate::require(verifier, [ADMIN_ROLE]),
            require_permissions,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/token", post(token))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/introspect", post(introspect))
        .route("/generate-auth", get(generate_auth))
        .route("/callback", get(callback))
        .merge(admin_routes)
        .with_state(shared_service)
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/register",
    tag = TAG,
    request_body(content = Credentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 408, response = RequestTimeoutResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
    ValidatedForm(credentials): ValidatedForm<Credentials>,
) -> IdentityResult<impl IntoResponse> {
    service.register(credentials).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// Exchange username and password for a token pair
#[utoipa::path(
    post,
    path = "/token",
    tag = TAG,
    request_body(content = Credentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn token<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
    ValidatedForm(credentials): ValidatedForm<Credentials>,
) -> IdentityResult<Json<TokenPair>> {
    Ok(Json(service.login(credentials).await?))
}

/// Trade a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/refresh",
    tag = TAG,
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn refresh<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
    ValidatedJson(request): ValidatedJson<TokenRequest>,
) -> IdentityResult<Json<TokenPair>> {
    Ok(Json(service.refresh(&request.token).await?))
}

/// End the session a refresh token belongs to
#[utoipa::path(
    post,
    path = "/logout",
    tag = TAG,
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Session ended", body = MessageResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn logout<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
    ValidatedJson(request): ValidatedJson<TokenRequest>,
) -> IdentityResult<Json<MessageResponse>> {
    service.logout(&request.token).await?;
    Ok(Json(MessageResponse::new("Logged out")))
}

/// Ask the identity provider whether the bearer token is live
#[utoipa::path(
    post,
    path = "/introspect",
    tag = TAG,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Introspection document", body = serde_json::Value),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn introspect<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
    BearerToken(token): BearerToken,
) -> IdentityResult<Json<Value>> {
    Ok(Json(service.introspect(&token).await?))
}

/// Redirect the browser to the provider's login page
#[utoipa::path(
    get,
    path = "/generate-auth",
    tag = TAG,
    responses(
        (status = 303, description = "Redirect to the authorization endpoint"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn generate_auth<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
) -> IdentityResult<Redirect> {
    let url = service.authorization_url()?;
    Ok(Redirect::to(&url))
}

/// Finish the authorization code flow
#[utoipa::path(
    get,
    path = "/callback",
    tag = TAG,
    params(CallbackQuery),
    responses(
        (status = 200, description = "Tokens for the authenticated user", body = CallbackTokens),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn callback<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
    Query(query): Query<CallbackQuery>,
) -> IdentityResult<Json<CallbackTokens>> {
    Ok(Json(service.callback(query.code.as_deref()).await?))
}

/// List realm users
#[utoipa::path(
    get,
    path = "/users",
    tag = TAG,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Realm users", body = Vec<UserSummary>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
) -> IdentityResult<Json<Vec<UserSummary>>> {
    Ok(Json(service.list_users().await?))
}

/// Reset a user's password
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = TAG,
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Keycloak user ID")),
    request_body = UpdatePassword,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_password<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
    Path(id): Path<String>,
    ValidatedJson(update): ValidatedJson<UpdatePassword>,
) -> IdentityResult<Json<MessageResponse>> {
    service.update_password(&id, update).await?;
    Ok(Json(MessageResponse::new("Password updated")))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = TAG,
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Keycloak user ID")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<P: IdentityProvider>(
    State(service): State<Arc<AuthService<P>>>,
    Path(id): Path<String>,
) -> IdentityResult<Json<MessageResponse>> {
    service.delete_user(&id).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}
