//! Liveness endpoint.

use axum::Json;

use crate::models::PingResponse;

/// `GET /api/ping` — confirms the server is up.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        response: "pong".into(),
        server_status: "running".into(),
    })
}
