//! # 账户处理器

use std::sync::Arc;

use axum::Extension;
use axum::extract::{Path, State};
use axum::response::Response;

use crate::auth::AuthContext;
use crate::error::Result;
use crate::management::response;
use crate::management::server::AppState;

/// 用户名下所有已同步的账户
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(user_id): Path<i32>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    Ok(response::success(state.accounts().list_accounts(user_id).await?))
}
