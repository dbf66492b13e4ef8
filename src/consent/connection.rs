//! # 账户访问同意服务
//!
//! 每个 (user, bank, bank_client_id) 三元组最多一条记录。创建幂等，
//! 状态检查按状态机对账，删除前尽力撤销银行侧同意。

use std::sync::Arc;

use entity::{accounts, connected_banks};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use serde_json::json;

use super::Initiated;
use super::revocation::{RevocationCoordinator, RevocationOutcome};
use super::state::{PollDecision, PollTarget, initial_state, poll_decision, reconcile};
use super::status::{ConsentKind, ConsentStatus};
use crate::accounts::AccountSyncService;
use crate::bank::{BankClient, BankProvider, BankTokenCache, ConsentAuth, ProviderRegistry};
use crate::database::{find_user, is_unique_violation};
use crate::error::{BridgeError, Context, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 账户访问同意申请的权限范围
pub const ACCOUNT_PERMISSIONS: [&str; 3] =
    ["ReadAccountsDetail", "ReadBalances", "ReadTransactionsDetail"];

/// 创建连接的请求
#[derive(Debug, Clone, Deserialize)]
pub struct InitiateConnection {
    pub bank_name: String,
    #[serde(alias = "client_id")]
    pub bank_client_id: String,
}

/// 账户访问同意（Connection）服务
#[derive(Debug, Clone)]
pub struct ConnectionService {
    db: DatabaseConnection,
    registry: Arc<ProviderRegistry>,
    client: BankClient,
    tokens: Arc<BankTokenCache>,
    accounts: AccountSyncService,
    revocation: RevocationCoordinator,
}

impl ConnectionService {
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        registry: Arc<ProviderRegistry>,
        client: BankClient,
        tokens: Arc<BankTokenCache>,
    ) -> Self {
        Self {
            accounts: AccountSyncService::new(db.clone(), client.clone(), tokens.clone()),
            revocation: RevocationCoordinator::new(client.clone(), tokens.clone()),
            db,
            registry,
            client,
            tokens,
        }
    }

    #[must_use]
    pub const fn accounts(&self) -> &AccountSyncService {
        &self.accounts
    }

    /// 发起账户访问同意
    ///
    /// 同一三元组已有记录时原样返回，不调用银行。终止状态的记录同样原样返回，
    /// 需要先删除才能重新发起。
    pub async fn initiate(
        &self,
        user_id: i32,
        request: &InitiateConnection,
    ) -> Result<Initiated<connected_banks::Model>> {
        let bank_client_id = request.bank_client_id.trim();
        if bank_client_id.is_empty() {
            return Err(BridgeError::validation_field("bank_client_id 不能为空", "bank_client_id"));
        }

        let provider = self.registry.get(&request.bank_name)?;
        find_user(&self.db, user_id).await?;

        if let Some(existing) = self.find_triple(user_id, &provider.name, bank_client_id).await? {
            linfo!(
                "consent",
                LogStage::Db,
                LogComponent::Consent,
                "initiate_existing",
                "连接已存在，直接返回",
                connection_id = existing.id,
                status = existing.status
            );
            return Ok(Initiated::existing(existing));
        }

        let token = self.tokens.get_token(&provider).await?;
        let body = json!({
            "client_id": bank_client_id,
            "permissions": ACCOUNT_PERMISSIONS,
            "reason": "Account aggregation",
            "requesting_bank": provider.client_id,
        });
        let response = self
            .client
            .request_account_consent(&provider, &token, &body)
            .await?;
        let state = initial_state(ConsentKind::Account, &provider.name, provider.auto_approve, &response)?;

        let now = self.tokens.clock().now().naive_utc();
        let inserted = connected_banks::ActiveModel {
            user_id: Set(user_id),
            bank_name: Set(provider.name.clone()),
            bank_client_id: Set(bank_client_id.to_string()),
            request_id: Set(state.request_id.clone()),
            consent_id: Set(state.consent_id.clone()),
            status: Set(state.status.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        let record = match inserted {
            Ok(record) => record,
            Err(e) if is_unique_violation(&e) => {
                // 并发创建：返回先写入的那一条
                return self
                    .find_triple(user_id, &provider.name, bank_client_id)
                    .await?
                    .map(Initiated::existing)
                    .ok_or_else(|| e.into());
            }
            Err(e) => return Err(e.into()),
        };

        linfo!(
            "consent",
            LogStage::Db,
            LogComponent::Consent,
            "initiate",
            "已创建账户访问同意",
            connection_id = record.id,
            provider = provider.name,
            status = record.status
        );

        let record = if state.status.is_usable() {
            self.sync_best_effort(&provider, record).await?
        } else {
            record
        };

        Ok(Initiated::created(record))
    }

    /// 检查同意状态，必要时同步账户
    ///
    /// `refresh` 为 true 时，已激活的连接也会重新查询银行并刷新账户。
    pub async fn check_status(
        &self,
        user_id: i32,
        connection_id: i32,
        refresh: bool,
    ) -> Result<connected_banks::Model> {
        let record = self.get(user_id, connection_id).await?;
        let current = ConsentStatus::parse(&record.status);

        let target = match poll_decision(
            ConsentKind::Account,
            &current,
            record.request_id.as_deref(),
            record.consent_id.as_deref(),
            refresh,
        ) {
            PollDecision::Skip => return Ok(record),
            PollDecision::Poll(target) => target,
        };

        let provider = self.registry.get(&record.bank_name)?;
        let response = match &target {
            PollTarget::RequestId(id) => {
                let token = self.tokens.get_token(&provider).await?;
                self.client
                    .get_account_consent(&provider, id, ConsentAuth::Bearer(&token))
                    .await?
            }
            PollTarget::ConsentId(id) => {
                self.client
                    .get_account_consent(&provider, id, ConsentAuth::ClientHeader)
                    .await?
            }
        };

        let (record, activated) =
            match reconcile(ConsentKind::Account, &current, record.consent_id.as_deref(), &response) {
                Some(transition) => {
                    linfo!(
                        "consent",
                        LogStage::Db,
                        LogComponent::Consent,
                        "transition",
                        &format!("连接状态 {} -> {}", current, transition.status),
                        connection_id = record.id
                    );
                    let mut active: connected_banks::ActiveModel = record.into();
                    active.status = Set(transition.status.to_string());
                    active.consent_id = Set(transition.consent_id);
                    active.updated_at = Set(self.tokens.clock().now().naive_utc());
                    (active.update(&self.db).await?, transition.activated)
                }
                None => (record, false),
            };

        let usable = ConsentStatus::parse(&record.status).is_usable();
        if activated || (refresh && usable) {
            return self.sync_best_effort(&provider, record).await;
        }
        Ok(record)
    }

    /// 撤销并删除连接及其账户
    pub async fn delete(&self, user_id: i32, connection_id: i32) -> Result<RevocationOutcome> {
        let record = self.get(user_id, connection_id).await?;

        let outcome = match self.registry.get(&record.bank_name) {
            Ok(provider) => {
                self.revocation
                    .revoke(
                        ConsentKind::Account,
                        &provider,
                        record.request_id.as_deref(),
                        record.consent_id.as_deref(),
                    )
                    .await
            }
            Err(_) => RevocationOutcome::Skipped,
        };

        accounts::Entity::delete_many()
            .filter(accounts::Column::ConnectionId.eq(record.id))
            .exec(&self.db)
            .await
            .with_context(|| format!("删除连接 {} 的账户失败", record.id))?;
        connected_banks::Entity::delete_by_id(record.id)
            .exec(&self.db)
            .await
            .with_context(|| format!("删除连接 {} 失败", record.id))?;

        linfo!(
            "consent",
            LogStage::Db,
            LogComponent::Consent,
            "delete",
            "连接已删除",
            connection_id = record.id,
            revoked = outcome.is_success()
        );
        Ok(outcome)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<connected_banks::Model>> {
        Ok(connected_banks::Entity::find()
            .filter(connected_banks::Column::UserId.eq(user_id))
            .order_by_asc(connected_banks::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// 按 id 查找属于该用户的连接
    pub async fn get(&self, user_id: i32, connection_id: i32) -> Result<connected_banks::Model> {
        connected_banks::Entity::find_by_id(connection_id)
            .filter(connected_banks::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| BridgeError::not_found("connection", connection_id))
    }

    async fn find_triple(
        &self,
        user_id: i32,
        bank_name: &str,
        bank_client_id: &str,
    ) -> Result<Option<connected_banks::Model>> {
        Ok(connected_banks::Entity::find()
            .filter(connected_banks::Column::UserId.eq(user_id))
            .filter(connected_banks::Column::BankName.eq(bank_name))
            .filter(connected_banks::Column::BankClientId.eq(bank_client_id))
            .one(&self.db)
            .await?)
    }

    /// 同步失败只记录警告，返回最新的记录
    async fn sync_best_effort(
        &self,
        provider: &BankProvider,
        record: connected_banks::Model,
    ) -> Result<connected_banks::Model> {
        if let Err(e) = self.accounts.sync_connection(provider, &record).await {
            lwarn!(
                "consent",
                LogStage::ExternalApi,
                LogComponent::AccountSync,
                "sync_failed",
                &format!("账户同步失败: {e}"),
                connection_id = record.id
            );
            return Ok(record);
        }

        Ok(connected_banks::Entity::find_by_id(record.id)
            .one(&self.db)
            .await?
            .unwrap_or(record))
    }
}
