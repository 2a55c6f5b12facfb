use axum::{Json, Router, routing::get};
use axum_helpers::PermissionGate;
use domain_events::{EventService, PgEventRepository};
use domain_identity::{ADMIN_ROLE, AuthService, KeycloakClient};
use serde_json::{Value, json};

use crate::state::AppState;

pub mod admin;
pub mod broker;
pub mod health;

/// API routes without the `/api` prefix, which `create_router` adds.
pub fn routes(
    state: &AppState,
    events: EventService<PgEventRepository>,
    identity: AuthService<KeycloakClient>,
) -> Router {
    let authenticated = PermissionGate::authenticated(state.verifier.clone());
    let admin_only = PermissionGate::require(state.verifier.clone(), [ADMIN_ROLE]);

    Router::new()
        .route("/", get(status))
        .nest("/v1/events", domain_events::handlers::router(events, authenticated))
        .nest(
            "/v1/auth",
            domain_identity::handlers::router(identity, state.verifier.clone()),
        )
        .nest("/v1/kafka", broker::router(state.broker.clone(), admin_only))
        .nest("/v1/admin", admin::router(state.verifier.clone()))
}

async fn status() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `/ready` with live checks of every backing service.
pub fn ready_router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
