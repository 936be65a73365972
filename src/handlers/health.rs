use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store_ok: bool,
    pub fallback_entries: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store_ok = match state.store.as_deref() {
        Some(store) => store.list(1).await.is_ok(),
        None => false,
    };

    Json(HealthResponse {
        status: if store_ok { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        store_ok,
        fallback_entries: state.fallback.entries().len(),
    })
}
