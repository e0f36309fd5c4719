//! Authorization endpoint handler.
//!
//! Always responds 200 with a decision document. The HTTP status never
//! reflects the outcome; callers read the `effect` field.

use crate::decision::Decision;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

/// Evaluate the request's bearer credential and return the decision.
pub async fn authorize(State(state): State<AppState>, headers: HeaderMap) -> Json<Decision> {
    Json(state.authorizer.authorize(&headers).await)
}
