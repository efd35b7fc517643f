use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready once settings are loaded; echoes the run-wide engine settings.
pub async fn ready(State(state): State<AppState>) -> Json<Value> {
    let settings = state.repricer.settings();
    Json(json!({
        "status": "ready",
        "fixedOffset": settings.fixed_offset.to_money_string(),
        "shortExpiryHours": settings.short_expiry.num_hours(),
    }))
}
