//! # 账户访问同意处理器

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::consent::InitiateConnection;
use crate::error::Result;
use crate::management::response;
use crate::management::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CheckQuery {
    /// 已激活的连接也重新查询并刷新账户
    #[serde(default)]
    pub refresh: bool,
}

pub async fn list_connections(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(user_id): Path<i32>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    Ok(response::success(state.connections.list(user_id).await?))
}

pub async fn initiate_connection(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(user_id): Path<i32>,
    Json(request): Json<InitiateConnection>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    let result = state.connections.initiate(user_id, &request).await?;
    Ok(if result.created {
        response::created(result)
    } else {
        response::success_with_message(result, "连接已存在")
    })
}

pub async fn check_connection(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path((user_id, id)): Path<(i32, i32)>,
    Query(query): Query<CheckQuery>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    let record = state
        .connections
        .check_status(user_id, id, query.refresh)
        .await?;
    Ok(response::success(record))
}

pub async fn delete_connection(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path((user_id, id)): Path<(i32, i32)>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    let outcome = state.connections.delete(user_id, id).await?;
    Ok(response::success_with_message(outcome, "连接已删除"))
}
