//! # 认证中间件
//!
//! 从请求头中提取JWT，验证并将其解析的用户信息注入到请求扩展中。

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{BridgeError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;
use crate::management::response;
use crate::management::server::AppState;

/// 包含认证用户信息的上下文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: i32,
    pub is_admin: bool,
}

impl AuthContext {
    /// 调用方必须是路径中的用户本人或管理员
    pub fn ensure_self_or_admin(&self, user_id: i32) -> Result<()> {
        if self.is_admin || self.user_id == user_id {
            Ok(())
        } else {
            Err(BridgeError::forbidden(format!(
                "用户 {} 无权访问用户 {} 的数据",
                self.user_id, user_id
            )))
        }
    }
}

/// 提取 `Bearer <token>` 中的令牌
#[must_use]
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Axum认证中间件
pub async fn auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string);

    let Some(token) = token else {
        return response::app_error(BridgeError::auth("缺少 Authorization: Bearer 令牌"));
    };

    let claims = match state.jwt.validate_token(&token) {
        Ok(claims) => claims,
        Err(e) => {
            lwarn!(
                "auth",
                LogStage::Authentication,
                LogComponent::Auth,
                "validate_token",
                &format!("令牌校验失败: {e}"),
                path = request.uri().path()
            );
            return response::app_error(e);
        }
    };

    let user_id = match claims.user_id() {
        Ok(user_id) => user_id,
        Err(e) => return response::app_error(e),
    };

    request.extensions_mut().insert(Arc::new(AuthContext {
        user_id,
        is_admin: claims.is_admin,
    }));
    next.run(request).await.into_response()
}
