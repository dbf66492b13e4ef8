//! # 同意撤销测试
//!
//! 本地删除总会发生；银行侧撤销结果只影响返回的 outcome

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    BANK_TOKEN, TEAM_CLIENT_ID, forbid_bank_calls, insert_account, insert_connection,
    insert_payment_consent, mount_token, owner, setup,
};
use entity::{accounts, connected_banks, payment_consents, payments};
use openbank_bridge::bank::{BankClient, BankProvider, BankTokenCache, ManualClock};
use openbank_bridge::consent::{ConsentKind, RevocationCoordinator, RevocationOutcome};
use pretty_assertions::assert_eq;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_request_id_only_and_404_still_deletes() {
    let env = setup().await;
    let record = insert_connection(
        &env.db,
        env.user_id,
        "abank",
        "awaitingauthorization",
        Some("r-1"),
        None,
    )
    .await;

    Mock::given(method("DELETE"))
        .and(path("/account-consents/r-1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&env.server)
        .await;

    let outcome = env
        .context
        .connections
        .delete(env.user_id, record.id)
        .await
        .unwrap();

    assert_eq!(outcome, RevocationOutcome::AlreadyGone { id: "r-1".to_string() });
    assert!(connected_banks::Entity::find_by_id(record.id).one(&env.db).await.unwrap().is_none());
}

#[tokio::test]
async fn test_consent_id_preferred_and_accounts_removed() {
    let env = setup().await;
    let record =
        insert_connection(&env.db, env.user_id, "abank", "active", Some("r-1"), Some("c-1")).await;
    insert_account(&env.db, record.id, "acc-1", Some(owner("40817810099910004312", "Ivan Petrov"))).await;
    insert_account(&env.db, record.id, "acc-2", None).await;

    // 账户同意撤销不需要令牌
    mount_token(&env.server, 0).await;
    Mock::given(method("DELETE"))
        .and(path("/account-consents/c-1"))
        .and(header("x-fapi-interaction-id", TEAM_CLIENT_ID))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&env.server)
        .await;

    let outcome = env
        .context
        .connections
        .delete(env.user_id, record.id)
        .await
        .unwrap();

    assert_eq!(outcome, RevocationOutcome::Revoked { id: "c-1".to_string() });
    assert_eq!(accounts::Entity::find().count(&env.db).await.unwrap(), 0);
    assert!(env.context.connections.list(env.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bank_error_is_reported_but_not_raised() {
    let env = setup().await;
    let record =
        insert_connection(&env.db, env.user_id, "abank", "active", None, Some("c-1")).await;

    Mock::given(method("DELETE"))
        .and(path("/account-consents/c-1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&env.server)
        .await;

    let outcome = env
        .context
        .connections
        .delete(env.user_id, record.id)
        .await
        .unwrap();

    assert!(matches!(outcome, RevocationOutcome::Failed { ref id, ref reason } if id == "c-1" && reason.contains("boom")));
    assert!(!outcome.is_success());
    assert!(env.context.connections.list(env.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_record_without_ids_skips_bank() {
    let env = setup().await;
    forbid_bank_calls(&env.server).await;
    let record = insert_connection(&env.db, env.user_id, "abank", "requested", None, None).await;

    let outcome = env
        .context
        .connections
        .delete(env.user_id, record.id)
        .await
        .unwrap();

    assert_eq!(outcome, RevocationOutcome::Skipped);
    assert!(env.context.connections.list(env.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_of_foreign_connection_is_not_found() {
    let env = setup().await;
    forbid_bank_calls(&env.server).await;
    let record =
        insert_connection(&env.db, env.user_id, "abank", "active", None, Some("c-1")).await;

    assert!(env.context.connections.delete(env.other_user_id, record.id).await.is_err());
    assert_eq!(env.context.connections.list(env.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_consent_revocation_uses_bearer_and_keeps_payments() {
    let env = setup().await;
    let consent =
        insert_payment_consent(&env.db, env.user_id, "abank", "approved", Some("pr-1"), Some("pc-1"))
            .await;

    let now = chrono::Utc::now().naive_utc();
    let payment = payments::ActiveModel {
        user_id: Set(env.user_id),
        payment_consent_id: Set(Some(consent.id)),
        idempotency_key: Set("key-1".to_string()),
        status: Set("pending".to_string()),
        amount: Set("10.00".to_string()),
        currency: Set("RUB".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&env.db)
    .await
    .unwrap();

    mount_token(&env.server, 1).await;
    Mock::given(method("DELETE"))
        .and(path("/payment-consents/pc-1"))
        .and(header("authorization", format!("Bearer {BANK_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&env.server)
        .await;

    let outcome = env
        .context
        .payment_consents
        .delete(env.user_id, consent.id)
        .await
        .unwrap();

    assert_eq!(outcome, RevocationOutcome::Revoked { id: "pc-1".to_string() });
    assert_eq!(payment_consents::Entity::find().count(&env.db).await.unwrap(), 0);

    let kept = payments::Entity::find_by_id(payment.id).one(&env.db).await.unwrap().unwrap();
    assert_eq!(kept.payment_consent_id, None);
}

#[tokio::test]
async fn test_unreachable_bank_yields_failed_outcome() {
    let client = BankClient::new(Duration::from_secs(2)).unwrap();
    let tokens = Arc::new(BankTokenCache::new(client.clone(), Arc::new(ManualClock::default())));
    let coordinator = RevocationCoordinator::new(client, tokens);
    let provider = BankProvider {
        name: "offline".to_string(),
        base_url: "http://127.0.0.1:1".to_string(),
        client_id: TEAM_CLIENT_ID.to_string(),
        client_secret: "secret".to_string(),
        auto_approve: false,
        icon_filename: None,
    };

    for kind in [ConsentKind::Account, ConsentKind::Payment] {
        let outcome = coordinator.revoke(kind, &provider, Some("r-1"), None).await;
        assert!(matches!(outcome, RevocationOutcome::Failed { ref id, .. } if id == "r-1"));
    }
}
