//! # 支付同意服务
//!
//! 与账户访问同意共享状态机，可用状态为 `approved`，所有银行调用都带 Bearer 令牌。
//! 创建时的请求体原样保存在 `details` 中。

use std::sync::Arc;

use entity::payment_consents;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::Initiated;
use super::revocation::{RevocationCoordinator, RevocationOutcome};
use super::state::{PollDecision, initial_state, poll_decision, reconcile};
use super::status::{ConsentKind, ConsentStatus};
use crate::bank::{BankClient, BankProvider, BankTokenCache, ProviderRegistry};
use crate::database::{find_user, is_unique_violation};
use crate::error::{BridgeError, Context, Result};
use crate::logging::{LogComponent, LogStage};
use crate::payment::money::{check_amount, check_currency, format_amount};
use crate::linfo;

/// 支付同意类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentConsentType {
    #[default]
    SingleUse,
    MultiUse,
    /// 可变周期支付
    Vrp,
}

fn default_currency() -> String {
    "RUB".to_string()
}

/// 创建支付同意的请求
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConsentRequest {
    pub bank_name: String,
    #[serde(alias = "client_id")]
    pub bank_client_id: String,
    #[serde(default)]
    pub consent_type: PaymentConsentType,
    pub debtor_account: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub amount: Option<Decimal>,
    pub creditor_name: Option<String>,
    pub creditor_account: Option<String>,
    pub reference: Option<String>,
    pub max_uses: Option<u32>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub max_amount_per_payment: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub max_total_amount: Option<Decimal>,
    pub allowed_creditor_accounts: Option<Vec<String>>,
    pub valid_until: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub vrp_max_individual_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub vrp_daily_limit: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub vrp_monthly_limit: Option<Decimal>,
}

impl PaymentConsentRequest {
    /// 校验请求字段
    pub fn validate(&self) -> Result<()> {
        if self.bank_client_id.trim().is_empty() {
            return Err(BridgeError::validation_field("bank_client_id 不能为空", "bank_client_id"));
        }
        if self.debtor_account.trim().is_empty() {
            return Err(BridgeError::validation_field("debtor_account 不能为空", "debtor_account"));
        }
        check_currency(&self.currency).map_err(|m| BridgeError::validation_field(m, "currency"))?;

        if self.consent_type == PaymentConsentType::SingleUse && self.amount.is_none() {
            return Err(BridgeError::validation_field("单次支付同意必须指定金额", "amount"));
        }

        let amounts = [
            ("amount", self.amount),
            ("max_amount_per_payment", self.max_amount_per_payment),
            ("max_total_amount", self.max_total_amount),
            ("vrp_max_individual_amount", self.vrp_max_individual_amount),
            ("vrp_daily_limit", self.vrp_daily_limit),
            ("vrp_monthly_limit", self.vrp_monthly_limit),
        ];
        for (field, value) in amounts {
            if let Some(value) = value {
                check_amount(&value).map_err(|m| BridgeError::validation_field(m, field))?;
            }
        }
        Ok(())
    }

    /// 组装银行接口请求体。金额以两位小数的文本发送。
    #[must_use]
    pub fn to_api_body(&self, provider: &BankProvider) -> Value {
        let mut body = json!({
            "requesting_bank": provider.client_id,
            "client_id": self.bank_client_id.trim(),
            "consent_type": self.consent_type,
            "debtor_account": self.debtor_account,
            "creditor_name": self.creditor_name,
            "creditor_account": self.creditor_account,
            "amount": self.amount.as_ref().map(format_amount),
            "currency": self.currency,
            "reference": self.reference,
        });

        let mut limits = Map::new();
        let mut put_amount = |key: &str, value: Option<Decimal>| {
            if let Some(value) = value {
                limits.insert(key.to_string(), Value::String(format_amount(&value)));
            }
        };
        put_amount("max_amount_per_payment", self.max_amount_per_payment);
        put_amount("max_total_amount", self.max_total_amount);
        put_amount("vrp_max_individual_amount", self.vrp_max_individual_amount);
        put_amount("vrp_daily_limit", self.vrp_daily_limit);
        put_amount("vrp_monthly_limit", self.vrp_monthly_limit);
        if let Some(max_uses) = self.max_uses {
            limits.insert("max_uses".to_string(), json!(max_uses));
        }
        if let Some(accounts) = &self.allowed_creditor_accounts {
            limits.insert("allowed_creditor_accounts".to_string(), json!(accounts));
        }
        if let Some(valid_until) = &self.valid_until {
            limits.insert("valid_until".to_string(), json!(valid_until.to_rfc3339()));
        }

        if let Value::Object(map) = &mut body {
            map.extend(limits);
        }
        body
    }
}

/// 支付同意服务
#[derive(Debug, Clone)]
pub struct PaymentConsentService {
    db: DatabaseConnection,
    registry: Arc<ProviderRegistry>,
    client: BankClient,
    tokens: Arc<BankTokenCache>,
    revocation: RevocationCoordinator,
}

impl PaymentConsentService {
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        registry: Arc<ProviderRegistry>,
        client: BankClient,
        tokens: Arc<BankTokenCache>,
    ) -> Self {
        Self {
            revocation: RevocationCoordinator::new(client.clone(), tokens.clone()),
            db,
            registry,
            client,
            tokens,
        }
    }

    /// 发起支付同意
    ///
    /// 同一三元组已有记录（包括已拒绝/已撤销的）时原样返回。
    pub async fn initiate(
        &self,
        user_id: i32,
        request: &PaymentConsentRequest,
    ) -> Result<Initiated<payment_consents::Model>> {
        request.validate()?;
        let provider = self.registry.get(&request.bank_name)?;
        find_user(&self.db, user_id).await?;
        let bank_client_id = request.bank_client_id.trim();

        if let Some(existing) = self.find_triple(user_id, &provider.name, bank_client_id).await? {
            linfo!(
                "consent",
                LogStage::Db,
                LogComponent::Consent,
                "initiate_existing",
                "支付同意已存在，直接返回",
                payment_consent_id = existing.id,
                status = existing.status
            );
            return Ok(Initiated::existing(existing));
        }

        let token = self.tokens.get_token(&provider).await?;
        let body = request.to_api_body(&provider);
        let response = self
            .client
            .request_payment_consent(&provider, &token, &body)
            .await?;
        let state = initial_state(ConsentKind::Payment, &provider.name, provider.auto_approve, &response)?;

        let now = self.tokens.clock().now().naive_utc();
        let inserted = payment_consents::ActiveModel {
            user_id: Set(user_id),
            bank_name: Set(provider.name.clone()),
            bank_client_id: Set(bank_client_id.to_string()),
            request_id: Set(state.request_id),
            consent_id: Set(state.consent_id),
            status: Set(state.status.to_string()),
            details: Set(Some(body.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(record) => {
                linfo!(
                    "consent",
                    LogStage::Db,
                    LogComponent::Consent,
                    "initiate",
                    "已创建支付同意",
                    payment_consent_id = record.id,
                    provider = provider.name,
                    status = record.status
                );
                Ok(Initiated::created(record))
            }
            Err(e) if is_unique_violation(&e) => self
                .find_triple(user_id, &provider.name, bank_client_id)
                .await?
                .map(Initiated::existing)
                .ok_or_else(|| e.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// 检查支付同意状态
    pub async fn check_status(
        &self,
        user_id: i32,
        consent_db_id: i32,
    ) -> Result<payment_consents::Model> {
        let record = self.get(user_id, consent_db_id).await?;
        let current = ConsentStatus::parse(&record.status);

        let target = match poll_decision(
            ConsentKind::Payment,
            &current,
            record.request_id.as_deref(),
            record.consent_id.as_deref(),
            false,
        ) {
            PollDecision::Skip => return Ok(record),
            PollDecision::Poll(target) => target,
        };

        let provider = self.registry.get(&record.bank_name)?;
        let token = self.tokens.get_token(&provider).await?;
        let response = self
            .client
            .get_payment_consent(&provider, &token, target.id())
            .await?;

        let Some(transition) =
            reconcile(ConsentKind::Payment, &current, record.consent_id.as_deref(), &response)
        else {
            return Ok(record);
        };

        linfo!(
            "consent",
            LogStage::Db,
            LogComponent::Consent,
            "transition",
            &format!("支付同意状态 {} -> {}", current, transition.status),
            payment_consent_id = record.id
        );

        let mut active: payment_consents::ActiveModel = record.into();
        active.status = Set(transition.status.to_string());
        active.consent_id = Set(transition.consent_id);
        active.updated_at = Set(self.tokens.clock().now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    /// 撤销并删除支付同意。已发起的支付记录保留，引用置空。
    pub async fn delete(&self, user_id: i32, consent_db_id: i32) -> Result<RevocationOutcome> {
        let record = self.get(user_id, consent_db_id).await?;

        let outcome = match self.registry.get(&record.bank_name) {
            Ok(provider) => {
                self.revocation
                    .revoke(
                        ConsentKind::Payment,
                        &provider,
                        record.request_id.as_deref(),
                        record.consent_id.as_deref(),
                    )
                    .await
            }
            Err(_) => RevocationOutcome::Skipped,
        };

        payment_consents::Entity::delete_by_id(record.id)
            .exec(&self.db)
            .await
            .with_context(|| format!("删除支付同意 {} 失败", record.id))?;

        linfo!(
            "consent",
            LogStage::Db,
            LogComponent::Consent,
            "delete",
            "支付同意已删除",
            payment_consent_id = record.id,
            revoked = outcome.is_success()
        );
        Ok(outcome)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<payment_consents::Model>> {
        Ok(payment_consents::Entity::find()
            .filter(payment_consents::Column::UserId.eq(user_id))
            .order_by_asc(payment_consents::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn get(&self, user_id: i32, consent_db_id: i32) -> Result<payment_consents::Model> {
        payment_consents::Entity::find_by_id(consent_db_id)
            .filter(payment_consents::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| BridgeError::not_found("payment_consent", consent_db_id))
    }

    async fn find_triple(
        &self,
        user_id: i32,
        bank_name: &str,
        bank_client_id: &str,
    ) -> Result<Option<payment_consents::Model>> {
        Ok(payment_consents::Entity::find()
            .filter(payment_consents::Column::UserId.eq(user_id))
            .filter(payment_consents::Column::BankName.eq(bank_name))
            .filter(payment_consents::Column::BankClientId.eq(bank_client_id))
            .one(&self.db)
            .await?)
    }
}
