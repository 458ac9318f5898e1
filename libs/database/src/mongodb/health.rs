use mongodb::{Database, bson::doc};
use std::time::Instant;

use crate::common::DatabaseError;

/// Result of a timed MongoDB ping.
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Error text when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Ping the database.
///
/// # Example
/// ```ignore
/// let checks: Vec<(&str, HealthCheckFuture)> = vec![(
///     "mongodb",
///     Box::pin(async move { check_health(&db).await.map_err(|e| e.to_string()) }),
/// )];
/// ```
pub async fn check_health(db: &Database) -> Result<(), DatabaseError> {
    db.run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
        .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))
}

/// Ping the database and report latency alongside the outcome.
pub async fn check_health_detailed(db: &Database) -> HealthStatus {
    let start = Instant::now();
    let result = check_health(db).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    HealthStatus {
        healthy: result.is_ok(),
        message: result.err().map(|e| e.to_string()),
        response_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::TestMongo;

    #[tokio::test]
    async fn test_check_health() {
        let mongo = TestMongo::new().await;
        assert!(check_health(&mongo.database("health_test")).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_health_detailed() {
        let mongo = TestMongo::new().await;
        let status = check_health_detailed(&mongo.database("health_test")).await;
        assert!(status.healthy);
        assert!(status.message.is_none());
    }
}
