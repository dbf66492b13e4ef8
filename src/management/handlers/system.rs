//! # 系统处理器

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::management::response;
use crate::management::server::AppState;

#[derive(Serialize)]
struct HealthInfo {
    status: &'static str,
    database: bool,
    banks: usize,
    version: &'static str,
}

/// 存活探针
pub async fn ping_handler() -> &'static str {
    "pong"
}

/// 健康检查：数据库可用时返回 200，否则 503
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = state.db.ping().await.is_ok();
    let info = HealthInfo {
        status: if database { "healthy" } else { "degraded" },
        database,
        banks: state.registry.len(),
        version: env!("CARGO_PKG_VERSION"),
    };

    if database {
        response::success(info)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, axum::Json(info)).into_response()
    }
}
