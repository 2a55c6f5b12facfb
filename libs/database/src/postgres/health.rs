use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

use crate::common::DatabaseError;

/// Readiness check: one `SELECT 1` round trip through the pool.
pub async fn check_health(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    let ping = Statement::from_string(db.get_database_backend(), "SELECT 1");
    db.query_one_raw(ping)
        .await
        .map(|_| ())
        .map_err(|e| DatabaseError::HealthCheckFailed(format!("PostgreSQL: {}", e)))
}
