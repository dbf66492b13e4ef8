//! # 集成测试公共设施
//!
//! 内存 SQLite + wiremock 模拟银行 + 手动时钟

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use entity::{accounts, connected_banks, payment_consents, users};
use openbank_bridge::app::AppContext;
use openbank_bridge::bank::{ManualClock, ProviderRegistry};
use openbank_bridge::config::{AppConfig, AuthConfig, BankSeed, DatabaseConfig};
use openbank_bridge::database::{ensure_banks, init_database, run_migrations};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::json;
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const TEAM_CLIENT_ID: &str = "team-1";
pub const TEAM_SECRET: &str = "team-secret";
pub const BANK_TOKEN: &str = "bank-token-1";

/// 一次测试的完整环境
pub struct TestEnv {
    pub server: MockServer,
    pub db: DatabaseConnection,
    pub clock: ManualClock,
    pub context: Arc<AppContext>,
    pub config: Arc<AppConfig>,
    pub user_id: i32,
    pub other_user_id: i32,
}

/// 注册 `vbank`（自动批准）与 `abank`（需人工授权），二者都指向同一个模拟服务器
pub async fn setup() -> TestEnv {
    let server = MockServer::start().await;

    let config = Arc::new(AppConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..Default::default()
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            ..Default::default()
        },
        banks: vec![seed("vbank", &server.uri(), true), seed("abank", &server.uri(), false)],
        ..Default::default()
    });

    let db = init_database(&config.database).await.unwrap();
    run_migrations(&db).await.unwrap();
    ensure_banks(&db, &config.banks).await.unwrap();

    let user_id = create_user(&db, "ivan@example.com", false).await;
    let other_user_id = create_user(&db, "olga@example.com", false).await;

    let registry = ProviderRegistry::load(&db).await.unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap());
    let context =
        AppContext::new(config.clone(), db.clone(), registry, Arc::new(clock.clone())).unwrap();

    TestEnv {
        server,
        db,
        clock,
        context: Arc::new(context),
        config,
        user_id,
        other_user_id,
    }
}

fn seed(name: &str, base_url: &str, auto_approve: bool) -> BankSeed {
    BankSeed {
        name: name.to_string(),
        base_url: base_url.to_string(),
        client_id: TEAM_CLIENT_ID.to_string(),
        client_secret: TEAM_SECRET.to_string(),
        auto_approve,
        icon_filename: None,
    }
}

pub async fn create_user(db: &DatabaseConnection, email: &str, is_admin: bool) -> i32 {
    users::ActiveModel {
        email: Set(email.to_string()),
        is_admin: Set(is_admin),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

/// 令牌端点，`expected` 为期望的调用次数
pub async fn mount_token(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/bank-token"))
        .and(query_param("client_id", TEAM_CLIENT_ID))
        .and(query_param("client_secret", TEAM_SECRET))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": BANK_TOKEN,
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(expected)
        .mount(server)
        .await;
}

/// 任何请求都不应到达银行
pub async fn forbid_bank_calls(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

/// 账户列表响应体
pub fn accounts_body(owner_name: &str) -> serde_json::Value {
    json!({
        "data": {
            "account": [
                {
                    "accountId": "acc-1",
                    "status": "Enabled",
                    "currency": "RUB",
                    "accountType": "Personal",
                    "accountSubType": "Checking",
                    "account": [{
                        "schemeName": "RU.CBR.PAN",
                        "identification": "40817810099910004312",
                        "name": owner_name
                    }],
                    "balance": [{
                        "type": "InterimAvailable",
                        "amount": {"amount": "1200.00", "currency": "RUB"}
                    }]
                },
                {
                    "accountId": "acc-2",
                    "status": "Enabled",
                    "currency": "RUB",
                    "accountType": "Personal",
                    "accountSubType": "Savings",
                    "account": [{
                        "schemeName": "RU.CBR.PAN",
                        "identification": "40817810099910005423",
                        "name": owner_name
                    }]
                }
            ]
        }
    })
}

pub async fn insert_connection(
    db: &DatabaseConnection,
    user_id: i32,
    bank_name: &str,
    status: &str,
    request_id: Option<&str>,
    consent_id: Option<&str>,
) -> connected_banks::Model {
    let now = Utc::now().naive_utc();
    connected_banks::ActiveModel {
        user_id: Set(user_id),
        bank_name: Set(bank_name.to_string()),
        bank_client_id: Set(format!("{TEAM_CLIENT_ID}-{user_id}")),
        request_id: Set(request_id.map(str::to_string)),
        consent_id: Set(consent_id.map(str::to_string)),
        status: Set(status.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

/// `owner_data` 为 None 时模拟银行未返回持有人信息
pub async fn insert_account(
    db: &DatabaseConnection,
    connection_id: i32,
    api_account_id: &str,
    owner_data: Option<serde_json::Value>,
) -> accounts::Model {
    let now = Utc::now().naive_utc();
    accounts::ActiveModel {
        connection_id: Set(connection_id),
        api_account_id: Set(api_account_id.to_string()),
        status: Set(Some("Enabled".to_string())),
        currency: Set(Some("RUB".to_string())),
        owner_data: Set(owner_data.map(|v| v.to_string())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub fn owner(identification: &str, name: &str) -> serde_json::Value {
    json!([{"schemeName": "RU.CBR.PAN", "identification": identification, "name": name}])
}

pub async fn insert_payment_consent(
    db: &DatabaseConnection,
    user_id: i32,
    bank_name: &str,
    status: &str,
    request_id: Option<&str>,
    consent_id: Option<&str>,
) -> payment_consents::Model {
    let now = Utc::now().naive_utc();
    payment_consents::ActiveModel {
        user_id: Set(user_id),
        bank_name: Set(bank_name.to_string()),
        bank_client_id: Set(format!("{TEAM_CLIENT_ID}-{user_id}")),
        request_id: Set(request_id.map(str::to_string)),
        consent_id: Set(consent_id.map(str::to_string)),
        status: Set(status.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
