//! 账户列表同步
//!
//! 按 (connection_id, api_account_id) 更新或插入账户，并用第一个持有人名称
//! 填充连接的显示名。

use std::sync::Arc;

use entity::{accounts, connected_banks};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set, sea_query::JoinType,
};
use serde::Serialize;

use crate::bank::types::RemoteAccount;
use crate::bank::{BankClient, BankProvider, BankTokenCache};
use crate::error::{BridgeError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::linfo;

/// 一次同步的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub inserted: usize,
    pub updated: usize,
    pub full_name: Option<String>,
}

/// 账户同步服务
#[derive(Debug, Clone)]
pub struct AccountSyncService {
    db: DatabaseConnection,
    client: BankClient,
    tokens: Arc<BankTokenCache>,
}

impl AccountSyncService {
    #[must_use]
    pub const fn new(db: DatabaseConnection, client: BankClient, tokens: Arc<BankTokenCache>) -> Self {
        Self { db, client, tokens }
    }

    /// 拉取并保存某个连接下的账户
    ///
    /// 连接必须已有 `consent_id`。
    pub async fn sync_connection(
        &self,
        provider: &BankProvider,
        connection: &connected_banks::Model,
    ) -> Result<SyncSummary> {
        let consent_id = connection.consent_id.as_deref().ok_or_else(|| {
            BridgeError::validation_field("连接尚未授权，没有 consent_id", "consent_id")
        })?;

        let token = self.tokens.get_token(provider).await?;
        let remote = self
            .client
            .fetch_accounts(provider, &token, consent_id, &connection.bank_client_id)
            .await?;

        let now = self.tokens.clock().now().naive_utc();
        let mut summary = SyncSummary {
            inserted: 0,
            updated: 0,
            full_name: None,
        };

        for account in &remote {
            if self.upsert_account(connection.id, account, now).await? {
                summary.inserted += 1;
            } else {
                summary.updated += 1;
            }
        }

        summary.full_name = remote.iter().find_map(RemoteAccount::owner_name);
        if let Some(name) = &summary.full_name
            && connection.full_name.as_ref() != Some(name)
        {
            let mut active: connected_banks::ActiveModel = connection.clone().into();
            active.full_name = Set(Some(name.clone()));
            active.updated_at = Set(now);
            active.update(&self.db).await?;
        }

        linfo!(
            "sync",
            LogStage::Db,
            LogComponent::AccountSync,
            "sync_connection",
            &format!("同步账户完成: 新增 {}, 更新 {}", summary.inserted, summary.updated),
            connection_id = connection.id,
            provider = provider.name
        );

        Ok(summary)
    }

    /// 返回 true 表示新插入
    async fn upsert_account(
        &self,
        connection_id: i32,
        account: &RemoteAccount,
        now: chrono::NaiveDateTime,
    ) -> Result<bool> {
        let owner_data = account
            .owner_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let balance_data = account
            .balance_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let existing = accounts::Entity::find()
            .filter(accounts::Column::ConnectionId.eq(connection_id))
            .filter(accounts::Column::ApiAccountId.eq(&account.account_id))
            .one(&self.db)
            .await?;

        let (mut active, inserted) = match existing {
            Some(model) => (accounts::ActiveModel::from(model), false),
            None => (
                accounts::ActiveModel {
                    connection_id: Set(connection_id),
                    api_account_id: Set(account.account_id.clone()),
                    created_at: Set(now),
                    ..Default::default()
                },
                true,
            ),
        };

        active.status = Set(account.status.clone());
        active.currency = Set(account.currency.clone());
        active.account_type = Set(account.account_type.clone());
        active.account_subtype = Set(account.account_subtype.clone());
        active.nickname = Set(account.nickname.clone());
        active.opening_date = Set(account.opening_date.clone());
        active.owner_data = Set(owner_data);
        active.balance_data = Set(balance_data);
        active.updated_at = Set(now);

        if inserted {
            active.insert(&self.db).await?;
        } else {
            active.update(&self.db).await?;
        }
        Ok(inserted)
    }

    /// 用户名下所有连接的账户
    pub async fn list_accounts(&self, user_id: i32) -> Result<Vec<accounts::Model>> {
        let rows = accounts::Entity::find()
            .join(JoinType::InnerJoin, accounts::Relation::Connection.def())
            .filter(connected_banks::Column::UserId.eq(user_id))
            .order_by_asc(accounts::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// 按 id 查找账户及其所属连接。账户不存在或不属于该用户时返回 `None`。
    pub async fn find_owned(
        &self,
        user_id: i32,
        account_id: i32,
    ) -> Result<Option<(accounts::Model, connected_banks::Model)>> {
        let found = accounts::Entity::find_by_id(account_id)
            .find_also_related(connected_banks::Entity)
            .one(&self.db)
            .await?;

        Ok(match found {
            Some((account, Some(connection))) if connection.user_id == user_id => {
                Some((account, connection))
            }
            _ => None,
        })
    }
}
