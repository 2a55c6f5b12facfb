use redis::aio::ConnectionManager;

use crate::common::DatabaseError;

/// Readiness check: `PING` must answer `PONG`.
pub async fn check_health(conn: &mut ConnectionManager) -> Result<(), DatabaseError> {
    let reply: String = redis::cmd("PING")
        .query_async(conn)
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(format!("Redis: {}", e)))?;

    match reply.as_str() {
        "PONG" => Ok(()),
        other => Err(DatabaseError::HealthCheckFailed(format!(
            "Redis: unexpected PING reply {}",
            other
        ))),
    }
}
