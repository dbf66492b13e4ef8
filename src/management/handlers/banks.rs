//! # 银行列表处理器

use axum::extract::State;
use axum::response::Response;

use crate::bank::BankProvider;
use crate::management::response;
use crate::management::server::AppState;

/// 已配置的银行，不包含客户端密钥
pub async fn list_banks(State(state): State<AppState>) -> Response {
    let mut banks: Vec<BankProvider> = state
        .registry
        .list()
        .map(|provider| provider.as_ref().clone())
        .collect();
    banks.sort_by(|a, b| a.name.cmp(&b.name));
    response::success(banks)
}
