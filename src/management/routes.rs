//! # 路由配置
//!
//! 除 `/health` 外的所有路由都需要 Bearer 认证

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use super::handlers::{accounts, banks, connections, payment_consents, payments, system};
use crate::auth::middleware::auth;
use crate::management::server::AppState;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/banks", get(banks::list_banks))
        .nest("/users/{user_id}", user_routes())
        .route_layer(from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/health", get(system::health_check))
        .merge(protected)
        .with_state(state)
}

/// 用户范围内的路由
fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/connections",
            get(connections::list_connections).post(connections::initiate_connection),
        )
        .route(
            "/connections/{id}",
            post(connections::check_connection).delete(connections::delete_connection),
        )
        .route("/accounts", get(accounts::list_accounts))
        .route(
            "/payment-consents",
            get(payment_consents::list_payment_consents)
                .post(payment_consents::initiate_payment_consent),
        )
        .route(
            "/payment-consents/{id}",
            post(payment_consents::check_payment_consent)
                .delete(payment_consents::delete_payment_consent),
        )
        .route(
            "/payments",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route("/payments/internal-transfer", post(payments::internal_transfer))
        .route("/payments/{id}/status", post(payments::refresh_payment_status))
}
