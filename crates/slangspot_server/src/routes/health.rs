use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "ping": slangspot_core::ping(),
        "version": slangspot_core::core_version(),
    }))
}
