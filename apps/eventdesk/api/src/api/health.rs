//! Readiness: every backing service must answer.

use crate::state::AppState;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};

pub async fn ready_handler(State(state): State<AppState>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![
        (
            "database",
            Box::pin(async {
                database::postgres::check_health(&state.db)
                    .await
                    .map_err(|e| e.to_string())
            }),
        ),
        (
            "redis",
            Box::pin(async {
                let mut redis = state.redis.clone();
                database::redis::check_health(&mut redis)
                    .await
                    .map_err(|e| e.to_string())
            }),
        ),
        (
            "kafka",
            Box::pin(async {
                state
                    .broker
                    .health_check()
                    .await
                    .map_err(|e| format!("Kafka metadata fetch failed: {}", e))
            }),
        ),
    ];

    run_health_checks(checks).await.into_response()
}
