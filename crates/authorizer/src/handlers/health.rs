//! Health check handler.

use axum::Json;
use serde_json::{json, Value};

/// Liveness probe. The service is stateless, so reachable means healthy.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "authorizer"
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_healthy() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "authorizer");
    }
}
