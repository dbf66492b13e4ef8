//! # 管理 API 测试
//!
//! 直接对路由器调用 `oneshot`，不监听端口

mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::{TestEnv, forbid_bank_calls, insert_account, insert_connection, owner, setup};
use openbank_bridge::management::server::ManagementServer;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

fn router(env: &TestEnv) -> Router {
    ManagementServer::new(env.config.server.clone(), env.context.clone()).router()
}

fn bearer(env: &TestEnv, user_id: i32, is_admin: bool) -> String {
    let token = env.context.jwt.generate_token(user_id, is_admin).unwrap();
    format!("Bearer {token}")
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, auth: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_and_ping_are_public() {
    let env = setup().await;

    let (status, body) = send(router(&env), get("/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], true);
    assert_eq!(body["data"]["banks"], 2);

    let response = router(&env).oneshot(get("/ping", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"pong");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let env = setup().await;

    let (status, body) = send(router(&env), get("/api/banks", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");

    let (status, _) = send(router(&env), get("/api/banks", Some("Bearer not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_banks_listing_hides_secrets() {
    let env = setup().await;
    let auth = bearer(&env, env.user_id, false);

    let (status, body) = send(router(&env), get("/api/banks", Some(&auth))).await;
    assert_eq!(status, StatusCode::OK);

    let banks = body["data"].as_array().unwrap();
    let names: Vec<&str> = banks.iter().map(|b| b["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["abank", "vbank"]);
    assert!(banks.iter().all(|b| b.get("client_secret").is_none()));
}

#[tokio::test]
async fn test_user_scope_is_enforced() {
    let env = setup().await;
    let own = bearer(&env, env.user_id, false);
    let uri = format!("/api/users/{}/connections", env.other_user_id);

    let (status, body) = send(router(&env), get(&uri, Some(&own))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "PERMISSION_ERROR");

    let admin = bearer(&env, env.user_id, true);
    let (status, body) = send(router(&env), get(&uri, Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_connections_and_accounts_listing() {
    let env = setup().await;
    let connection =
        insert_connection(&env.db, env.user_id, "vbank", "active", None, Some("c-1")).await;
    insert_account(&env.db, connection.id, "acc-1", Some(owner("40817810099910004312", "Ivan Petrov"))).await;
    let auth = bearer(&env, env.user_id, false);

    let (status, body) = send(
        router(&env),
        get(&format!("/api/users/{}/connections", env.user_id), Some(&auth)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["status"], "active");
    assert_eq!(body["data"][0]["consent_id"], "c-1");

    let (status, body) = send(
        router(&env),
        get(&format!("/api/users/{}/accounts", env.user_id), Some(&auth)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["api_account_id"], "acc-1");
}

#[tokio::test]
async fn test_payment_ownership_failure_looks_like_not_found() {
    let env = setup().await;
    forbid_bank_calls(&env.server).await;
    let auth = bearer(&env, env.user_id, false);

    let (status, body) = send(
        router(&env),
        post_json(
            &format!("/api/users/{}/payments", env.user_id),
            &auth,
            &json!({
                "payment_consent_id": 999,
                "debtor_account_id": 999,
                "creditor_name": "OOO Romashka",
                "creditor_account": "40702810900000000001",
                "creditor_bank_code": "abank",
                "amount": "10.00",
                "currency": "RUB"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_connection_is_not_found() {
    let env = setup().await;
    forbid_bank_calls(&env.server).await;
    let auth = bearer(&env, env.user_id, false);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/users/{}/connections/42", env.user_id))
        .header(header::AUTHORIZATION, &auth)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router(&env), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
