//! # 系统处理器

use axum::Json;
use serde_json::{Value, json};

/// 健康检查
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn ping() -> &'static str {
    "pong"
}
