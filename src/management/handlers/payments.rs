//! # 支付处理器

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::{Extension, Json};

use crate::auth::AuthContext;
use crate::bank::client::IDEMPOTENCY_KEY_HEADER;
use crate::error::Result;
use crate::management::response;
use crate::management::server::AppState;
use crate::payment::{InternalTransferRequest, PaymentRequest, PaymentResult};

/// 请求体未携带幂等键时使用请求头中的值
fn header_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn payment_response(result: PaymentResult) -> Response {
    if result.replayed {
        response::success_with_message(result, "幂等键已有支付记录")
    } else {
        response::created(result)
    }
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(user_id): Path<i32>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    Ok(response::success(state.payments.list_payments(user_id).await?))
}

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(user_id): Path<i32>,
    headers: HeaderMap,
    Json(mut request): Json<PaymentRequest>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    if request.idempotency_key.is_none() {
        request.idempotency_key = header_key(&headers);
    }
    let result = state.payments.initiate_payment(user_id, &request).await?;
    Ok(payment_response(result))
}

pub async fn internal_transfer(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path(user_id): Path<i32>,
    headers: HeaderMap,
    Json(mut request): Json<InternalTransferRequest>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    if request.idempotency_key.is_none() {
        request.idempotency_key = header_key(&headers);
    }
    let result = state.payments.internal_transfer(user_id, &request).await?;
    Ok(payment_response(result))
}

pub async fn refresh_payment_status(
    State(state): State<AppState>,
    Extension(auth): Extension<Arc<AuthContext>>,
    Path((user_id, id)): Path<(i32, i32)>,
) -> Result<Response> {
    auth.ensure_self_or_admin(user_id)?;
    Ok(response::success(state.payments.refresh_status(user_id, id).await?))
}
