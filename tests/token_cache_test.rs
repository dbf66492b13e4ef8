//! # 银行令牌缓存测试
//!
//! 用手动时钟驱动过期，wiremock 统计令牌端点的调用次数

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use openbank_bridge::bank::{BankClient, BankProvider, BankTokenCache, ManualClock};
use openbank_bridge::BridgeError;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(name: &str, base_url: &str, client_id: &str) -> BankProvider {
    BankProvider {
        name: name.to_string(),
        base_url: base_url.to_string(),
        client_id: client_id.to_string(),
        client_secret: "secret".to_string(),
        auto_approve: false,
        icon_filename: None,
    }
}

fn cache(clock: &ManualClock) -> BankTokenCache {
    let client = BankClient::new(Duration::from_secs(5)).unwrap();
    BankTokenCache::new(client, Arc::new(clock.clone())).with_safety_margin(60)
}

async fn mount_token(server: &MockServer, client_id: &str, token: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/bank-token"))
        .and(query_param("client_id", client_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "expires_in": 3600
        })))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_token_reused_within_lifetime() {
    let server = MockServer::start().await;
    mount_token(&server, "team-1", "tok-1", 1).await;

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap());
    let tokens = cache(&clock);
    let vbank = provider("vbank", &server.uri(), "team-1");

    assert_eq!(tokens.get_token(&vbank).await.unwrap(), "tok-1");
    clock.advance(chrono::Duration::seconds(3000));
    assert_eq!(tokens.get_token(&vbank).await.unwrap(), "tok-1");

    let entry = tokens.entry("vbank").await.unwrap();
    assert_eq!(
        entry.expires_at,
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 59, 0).unwrap()
    );
}

#[tokio::test]
async fn test_token_refetched_after_safety_margin() {
    let server = MockServer::start().await;
    mount_token(&server, "team-1", "tok-1", 2).await;

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap());
    let tokens = cache(&clock);
    let vbank = provider("vbank", &server.uri(), "team-1");

    tokens.get_token(&vbank).await.unwrap();
    // 3600 - 60 秒之后视为过期
    clock.advance(chrono::Duration::seconds(3540));
    tokens.get_token(&vbank).await.unwrap();

    let entry = tokens.entry("vbank").await.unwrap();
    assert_eq!(
        entry.expires_at,
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 58, 0).unwrap()
    );
}

#[tokio::test]
async fn test_concurrent_requests_share_one_fetch() {
    let server = MockServer::start().await;
    mount_token(&server, "team-1", "tok-1", 1).await;

    let clock = ManualClock::default();
    let tokens = Arc::new(cache(&clock));
    let vbank = Arc::new(provider("vbank", &server.uri(), "team-1"));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let tokens = tokens.clone();
            let vbank = vbank.clone();
            tokio::spawn(async move { tokens.get_token(&vbank).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "tok-1");
    }
}

#[tokio::test]
async fn test_tokens_are_cached_per_provider() {
    let server = MockServer::start().await;
    mount_token(&server, "team-v", "tok-v", 1).await;
    mount_token(&server, "team-a", "tok-a", 1).await;

    let clock = ManualClock::default();
    let tokens = cache(&clock);
    let vbank = provider("vbank", &server.uri(), "team-v");
    let abank = provider("abank", &server.uri(), "team-a");

    assert_eq!(tokens.get_token(&vbank).await.unwrap(), "tok-v");
    assert_eq!(tokens.get_token(&abank).await.unwrap(), "tok-a");
    assert_eq!(tokens.get_token(&vbank).await.unwrap(), "tok-v");
}

#[tokio::test]
async fn test_token_endpoint_failure_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/bank-token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .expect(2)
        .mount(&server)
        .await;

    let clock = ManualClock::default();
    let tokens = cache(&clock);
    let vbank = provider("vbank", &server.uri(), "team-1");

    for _ in 0..2 {
        let err = tokens.get_token(&vbank).await.unwrap_err();
        assert!(matches!(err, BridgeError::ProviderUnavailable { ref provider, .. } if provider == "vbank"));
    }
    assert!(tokens.entry("vbank").await.is_none());
}

#[tokio::test]
async fn test_invalidate_forces_refetch() {
    let server = MockServer::start().await;
    mount_token(&server, "team-1", "tok-1", 2).await;

    let clock = ManualClock::default();
    let tokens = cache(&clock);
    let vbank = provider("vbank", &server.uri(), "team-1");

    tokens.get_token(&vbank).await.unwrap();
    tokens.invalidate("vbank").await;
    tokens.get_token(&vbank).await.unwrap();
}

#[tokio::test]
async fn test_out_of_range_lifetime_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/bank-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-huge",
            "expires_in": i64::MAX
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clock = ManualClock::default();
    let tokens = Arc::new(cache(&clock));
    let vbank = provider("vbank", &server.uri(), "team-1");

    // 在独立任务中执行，确认不会 panic
    let task = {
        let tokens = Arc::clone(&tokens);
        tokio::spawn(async move { tokens.get_token(&vbank).await })
    };
    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, BridgeError::ProviderUnavailable { ref provider, .. } if provider == "vbank"));
    assert!(tokens.entry("vbank").await.is_none());
}
