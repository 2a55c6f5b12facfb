use axum::{Extension, Json, Router, middleware, routing::get};
use axum_helpers::{
    Claims, PermissionGate, TokenVerifier,
    errors::responses::{ForbiddenResponse, UnauthorizedResponse},
    require_permissions,
};
use domain_identity::{ADMIN_ROLE, MessageResponse};
use std::sync::Arc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(greet_admin), tags((name = "admin", description = "Administrator-only endpoints")))]
pub struct AdminApiDoc;

pub fn router(verifier: Arc<TokenVerifier>) -> Router {
    Router::new().route("/", get(greet_admin)).layer(middleware::from_fn_with_state(
        PermissionGate::require(verifier, [ADMIN_ROLE]),
        require_permissions,
    ))
}

/// Greet the calling administrator
#[utoipa::path(
    get,
    path = "",
    tag = "admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Greeting", body = MessageResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn greet_admin(Extension(claims): Extension<Claims>) -> Json<MessageResponse> {
    Json(MessageResponse::new(format!(
        "Hello, admin {}",
        claims.username()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum_helpers::auth::testing::{bearer, claims_for, sign, static_verifier};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn greet(roles: &[&str]) -> (StatusCode, serde_json::Value) {
        let token = sign(&claims_for("frontend", "root", roles));
        let request = Request::get("/")
            .header(header::AUTHORIZATION, bearer(&token))
            .body(Body::empty())
            .unwrap();
        let response = router(static_verifier("backend")).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_admin_is_greeted_by_name() {
        let (status, body) = greet(&["admin"]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello, admin root");
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let (status, _) = greet(&["user"]).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
