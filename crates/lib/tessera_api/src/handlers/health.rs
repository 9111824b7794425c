//! Health endpoint: reports version and store reachability.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::AppState;
use crate::models::HealthResponse;

/// `GET /api/health`: always 200; `storeConnected` reflects a store ping.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = match state.sessions.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("store ping failed: {e}");
            false
        }
    };

    Json(HealthResponse {
        status: "ok".into(),
        version: tessera_core::version().to_string(),
        store_connected,
    })
}
