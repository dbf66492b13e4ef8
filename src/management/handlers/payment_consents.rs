//! # 支付同意处理器

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::{Extension, Json};

use crate::auth::AuthContext;
use crate::consent::PaymentConsentRequest;
use crate::error::Result;
use crate::management::response;
use crate::management::server::AppState;

pub async fn list_payment_consents(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(user_id): Path<i32>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    Ok(response::success(state.payment_consents.list(user_id).await?))
}

pub async fn initiate_payment_consent(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(user_id): Path<i32>,
    Json(request): Json<PaymentConsentRequest>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    let result = state.payment_consents.initiate(user_id, &request).await?;
    Ok(if result.created {
        response::created(result)
    } else {
        response::success_with_message(result, "支付同意已存在")
    })
}

pub async fn check_payment_consent(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path((user_id, id)): Path<(i32, i32)>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    Ok(response::success(state.payment_consents.check_status(user_id, id).await?))
}

pub async fn delete_payment_consent(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path((user_id, id)): Path<(i32, i32)>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    let outcome = state.payment_consents.delete(user_id, id).await?;
    Ok(response::success_with_message(outcome, "支付同意已删除"))
}
