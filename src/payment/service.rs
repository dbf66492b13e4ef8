//! # 支付发起服务
//!
//! 所有前置检查都在调用银行之前完成。支付记录以幂等键唯一，同一键的重试
//! 返回已有记录而不再调用银行。

use std::sync::Arc;

use entity::{accounts, connected_banks, payment_consents, payments};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::money::{check_amount, check_currency, format_amount};
use super::types::{
    CreditorDetails, InternalTransferRequest, PaymentInstruction, PaymentRequest, PaymentResult,
    account_identity,
};
use crate::accounts::AccountSyncService;
use crate::bank::{BankClient, BankTokenCache, ProviderRegistry};
use crate::consent::ConsentStatus;
use crate::database::is_unique_violation;
use crate::ensure_payment;
use crate::error::{BridgeError, PaymentCheck, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 银行未返回状态时记录的初始状态
const DEFAULT_PAYMENT_STATUS: &str = "pending";

/// 已通过前置检查、可以发送的支付
struct PreparedPayment {
    debtor: accounts::Model,
    debtor_connection: connected_banks::Model,
    consent: payment_consents::Model,
    consent_id: String,
}

/// 幂等重放时需要与已有记录一致的请求内容
#[derive(Clone, Copy)]
struct ReplayFingerprint<'a> {
    debtor_account_id: i32,
    payment_consent_id: i32,
    amount: &'a Decimal,
    currency: &'a str,
    creditor_identification: Option<&'a str>,
}

impl ReplayFingerprint<'_> {
    /// 已置空的引用（账户或同意已被删除）不参与比较
    fn matches(&self, existing: &payments::Model) -> bool {
        let same_creditor = match (self.creditor_identification, stored_creditor(existing)) {
            (Some(requested), Some(stored)) => requested == stored.identification,
            _ => true,
        };

        existing.amount == format_amount(self.amount)
            && existing.currency.eq_ignore_ascii_case(self.currency.trim())
            && existing.debtor_account_id.is_none_or(|id| id == self.debtor_account_id)
            && existing.payment_consent_id.is_none_or(|id| id == self.payment_consent_id)
            && same_creditor
    }
}

fn stored_creditor(payment: &payments::Model) -> Option<CreditorDetails> {
    serde_json::from_str(payment.creditor_details.as_deref()?).ok()
}

/// 支付服务
#[derive(Debug, Clone)]
pub struct PaymentService {
    db: DatabaseConnection,
    registry: Arc<ProviderRegistry>,
    client: BankClient,
    tokens: Arc<BankTokenCache>,
    accounts: AccountSyncService,
}

impl PaymentService {
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        registry: Arc<ProviderRegistry>,
        client: BankClient,
        tokens: Arc<BankTokenCache>,
    ) -> Self {
        Self {
            accounts: AccountSyncService::new(db.clone(), client.clone(), tokens.clone()),
            db,
            registry,
            client,
            tokens,
        }
    }

    /// 向外部收款人付款
    pub async fn initiate_payment(&self, user_id: i32, request: &PaymentRequest) -> Result<PaymentResult> {
        let fingerprint = ReplayFingerprint {
            debtor_account_id: request.debtor_account_id,
            payment_consent_id: request.payment_consent_id,
            amount: &request.amount,
            currency: &request.currency,
            creditor_identification: Some(request.creditor_account.as_str()),
        };
        if let Some(replay) = self
            .replay(user_id, request.idempotency_key.as_deref(), &fingerprint)
            .await?
        {
            return Ok(replay);
        }

        let prepared = self
            .prepare(
                user_id,
                request.debtor_account_id,
                request.payment_consent_id,
                &request.amount,
                &request.currency,
            )
            .await?;

        let creditor = CreditorDetails {
            name: request.creditor_name.clone(),
            identification: request.creditor_account.clone(),
            bank_code: request.creditor_bank_code.clone(),
        };

        self.execute(
            user_id,
            prepared,
            &creditor,
            &request.amount,
            &request.currency,
            request.reference.as_deref(),
            request.idempotency_key.as_deref(),
        )
        .await
    }

    /// 本人账户之间转账：收款方标识与名称取自本地账户数据
    pub async fn internal_transfer(
        &self,
        user_id: i32,
        request: &InternalTransferRequest,
    ) -> Result<PaymentResult> {
        let (creditor_account, creditor_connection) = self
            .accounts
            .find_owned(user_id, request.creditor_account_id)
            .await?
            .ok_or_else(|| {
                BridgeError::invalid_payment(
                    PaymentCheck::CreditorAccountOwnership,
                    format!("收款账户 {} 不属于当前用户", request.creditor_account_id),
                )
            })?;

        let creditor_identity = account_identity(&creditor_account).ok();
        let fingerprint = ReplayFingerprint {
            debtor_account_id: request.debtor_account_id,
            payment_consent_id: request.payment_consent_id,
            amount: &request.amount,
            currency: &request.currency,
            creditor_identification: creditor_identity.as_ref().map(|i| i.identification.as_str()),
        };
        if let Some(replay) = self
            .replay(user_id, request.idempotency_key.as_deref(), &fingerprint)
            .await?
        {
            return Ok(replay);
        }

        let prepared = self
            .prepare(
                user_id,
                request.debtor_account_id,
                request.payment_consent_id,
                &request.amount,
                &request.currency,
            )
            .await?;

        let identity = account_identity(&creditor_account)?;
        let name = identity.name.ok_or_else(|| {
            BridgeError::incomplete_account_data(creditor_account.id, "缺少账户持有人名称")
        })?;
        let creditor = CreditorDetails {
            name,
            identification: identity.identification,
            bank_code: creditor_connection.bank_name,
        };

        self.execute(
            user_id,
            prepared,
            &creditor,
            &request.amount,
            &request.currency,
            request.reference.as_deref(),
            request.idempotency_key.as_deref(),
        )
        .await
    }

    /// 已存在的幂等键：属于本人且请求内容一致则返回原记录，否则拒绝
    ///
    /// 重放不再检查同意状态：支付已经在银行侧完成。
    async fn replay(
        &self,
        user_id: i32,
        key: Option<&str>,
        fingerprint: &ReplayFingerprint<'_>,
    ) -> Result<Option<PaymentResult>> {
        let Some(key) = key else {
            return Ok(None);
        };
        if key.trim().is_empty() {
            return Err(BridgeError::validation_field("idempotency_key 不能为空", "idempotency_key"));
        }

        let Some(existing) = self.find_by_key(key).await? else {
            return Ok(None);
        };
        ensure_payment!(
            existing.user_id == user_id,
            PaymentCheck::IdempotencyKeyConflict,
            "幂等键已被使用"
        );
        ensure_payment!(
            fingerprint.matches(&existing),
            PaymentCheck::IdempotencyPayloadMismatch,
            "幂等键 {} 已用于内容不同的支付请求",
            key
        );

        linfo!(
            key,
            LogStage::Db,
            LogComponent::Payment,
            "replay",
            "幂等键已有支付记录，不再调用银行",
            payment_id = existing.id
        );
        Ok(Some(PaymentResult {
            payment: existing,
            replayed: true,
        }))
    }

    /// 前置检查：归属、同意状态、同一银行、金额与币种
    async fn prepare(
        &self,
        user_id: i32,
        debtor_account_id: i32,
        payment_consent_id: i32,
        amount: &Decimal,
        currency: &str,
    ) -> Result<PreparedPayment> {
        let (debtor, debtor_connection) = self
            .accounts
            .find_owned(user_id, debtor_account_id)
            .await?
            .ok_or_else(|| {
                BridgeError::invalid_payment(
                    PaymentCheck::DebtorAccountOwnership,
                    format!("付款账户 {debtor_account_id} 不属于当前用户"),
                )
            })?;

        let consent = payment_consents::Entity::find_by_id(payment_consent_id)
            .filter(payment_consents::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                BridgeError::invalid_payment(
                    PaymentCheck::ConsentOwnership,
                    format!("支付同意 {payment_consent_id} 不属于当前用户"),
                )
            })?;

        ensure_payment!(
            ConsentStatus::parse(&consent.status) == ConsentStatus::Approved,
            PaymentCheck::ConsentNotApproved,
            "支付同意尚未批准，当前状态: {}",
            consent.status
        );
        let consent_id = consent
            .consent_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                BridgeError::invalid_payment(PaymentCheck::ConsentIdMissing, "支付同意缺少 consent_id")
            })?;
        ensure_payment!(
            debtor_connection.bank_name == consent.bank_name,
            PaymentCheck::ProviderMismatch,
            "付款账户属于 {}，支付同意属于 {}",
            debtor_connection.bank_name,
            consent.bank_name
        );

        check_amount(amount).map_err(|m| BridgeError::invalid_payment(PaymentCheck::InvalidAmount, m))?;
        check_currency(currency)
            .map_err(|m| BridgeError::invalid_payment(PaymentCheck::InvalidCurrency, m))?;

        Ok(PreparedPayment {
            debtor,
            debtor_connection,
            consent,
            consent_id,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute(
        &self,
        user_id: i32,
        prepared: PreparedPayment,
        creditor: &CreditorDetails,
        amount: &Decimal,
        currency: &str,
        reference: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> Result<PaymentResult> {
        let debtor_identity = account_identity(&prepared.debtor)?;
        let provider = self.registry.get(&prepared.debtor_connection.bank_name)?;
        let key = idempotency_key.map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

        let token = self.tokens.get_token(&provider).await?;
        let body = PaymentInstruction {
            amount,
            currency,
            debtor_identification: &debtor_identity.identification,
            creditor,
            reference,
        }
        .to_api_body();

        let response = self
            .client
            .create_payment(
                &provider,
                &token,
                &prepared.consent_id,
                &key,
                &prepared.debtor_connection.bank_client_id,
                &body,
            )
            .await
            .inspect_err(|e| {
                lwarn!(
                    key,
                    LogStage::ExternalApi,
                    LogComponent::Payment,
                    "create_payment",
                    &format!("银行拒绝支付: {e}"),
                    provider = provider.name
                );
            })?;

        let now = self.tokens.clock().now().naive_utc();
        let inserted = payments::ActiveModel {
            user_id: Set(user_id),
            debtor_account_id: Set(Some(prepared.debtor.id)),
            payment_consent_id: Set(Some(prepared.consent.id)),
            idempotency_key: Set(key.clone()),
            bank_payment_id: Set(response.payment_id.clone()),
            status: Set(response
                .status
                .clone()
                .unwrap_or_else(|| DEFAULT_PAYMENT_STATUS.to_string())),
            amount: Set(format_amount(amount)),
            currency: Set(currency.to_string()),
            creditor_details: Set(Some(serde_json::to_string(creditor)?)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        match inserted {
            Ok(payment) => {
                linfo!(
                    key,
                    LogStage::Db,
                    LogComponent::Payment,
                    "payment_recorded",
                    "支付已发起",
                    payment_id = payment.id,
                    bank_payment_id = payment.bank_payment_id,
                    status = payment.status
                );
                Ok(PaymentResult {
                    payment,
                    replayed: false,
                })
            }
            Err(e) if is_unique_violation(&e) => {
                // 并发重试已写入同一幂等键
                let payment = self.find_by_key(&key).await?.ok_or_else(|| BridgeError::from(e))?;
                Ok(PaymentResult {
                    payment,
                    replayed: true,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 刷新支付状态，只更新 `status` 列
    pub async fn refresh_status(&self, user_id: i32, payment_id: i32) -> Result<payments::Model> {
        let payment = self.get(user_id, payment_id).await?;
        let bank_payment_id = payment.bank_payment_id.clone().ok_or_else(|| {
            BridgeError::validation_field("支付缺少银行侧 payment_id", "bank_payment_id")
        })?;

        let (bank_name, client_id) = self.resolve_bank(&payment).await?;
        let provider = self.registry.get(&bank_name)?;
        let token = self.tokens.get_token(&provider).await?;
        let response = self
            .client
            .get_payment(&provider, &token, &bank_payment_id, &client_id)
            .await?;

        match response.status {
            Some(status) if status != payment.status => {
                linfo!(
                    payment.idempotency_key,
                    LogStage::Db,
                    LogComponent::Payment,
                    "status_refreshed",
                    &format!("支付状态 {} -> {}", payment.status, status),
                    payment_id = payment.id
                );
                let mut active: payments::ActiveModel = payment.into();
                active.status = Set(status);
                active.updated_at = Set(self.tokens.clock().now().naive_utc());
                Ok(active.update(&self.db).await?)
            }
            _ => Ok(payment),
        }
    }

    /// 支付历史，最新的在前
    pub async fn list_payments(&self, user_id: i32) -> Result<Vec<payments::Model>> {
        Ok(payments::Entity::find()
            .filter(payments::Column::UserId.eq(user_id))
            .order_by_desc(payments::Column::CreatedAt)
            .order_by_desc(payments::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn get(&self, user_id: i32, payment_id: i32) -> Result<payments::Model> {
        payments::Entity::find_by_id(payment_id)
            .filter(payments::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| BridgeError::not_found("payment", payment_id))
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<payments::Model>> {
        Ok(payments::Entity::find()
            .filter(payments::Column::IdempotencyKey.eq(key))
            .one(&self.db)
            .await?)
    }

    /// 查询支付状态所用的银行与客户端标识：优先取付款账户所属连接，其次取支付同意
    async fn resolve_bank(&self, payment: &payments::Model) -> Result<(String, String)> {
        if let Some(account_id) = payment.debtor_account_id
            && let Some((_, connection)) = self.accounts.find_owned(payment.user_id, account_id).await?
        {
            return Ok((connection.bank_name, connection.bank_client_id));
        }

        if let Some(consent_id) = payment.payment_consent_id
            && let Some(consent) = payment_consents::Entity::find_by_id(consent_id).one(&self.db).await?
        {
            return Ok((consent.bank_name, consent.bank_client_id));
        }

        Err(BridgeError::validation(format!(
            "无法确定支付 {} 所属的银行",
            payment.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn stored() -> payments::Model {
        let now = Utc::now().naive_utc();
        payments::Model {
            id: 1,
            user_id: 1,
            debtor_account_id: Some(10),
            payment_consent_id: Some(20),
            idempotency_key: "key-1".to_string(),
            bank_payment_id: Some("p-1".to_string()),
            status: "pending".to_string(),
            amount: "250.00".to_string(),
            currency: "RUB".to_string(),
            creditor_details: Some(
                r#"{"name":"OOO Romashka","identification":"40702810900000000001","bank_code":"abank"}"#
                    .to_string(),
            ),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_fingerprint_matches_equivalent_request() {
        let amount = Decimal::from_str("250").unwrap();
        let fingerprint = ReplayFingerprint {
            debtor_account_id: 10,
            payment_consent_id: 20,
            amount: &amount,
            currency: "rub",
            creditor_identification: Some("40702810900000000001"),
        };
        assert!(fingerprint.matches(&stored()));
    }

    #[test]
    fn test_fingerprint_detects_changed_payload() {
        let amount = Decimal::from_str("250").unwrap();
        let other_amount = Decimal::from_str("251").unwrap();
        let base = ReplayFingerprint {
            debtor_account_id: 10,
            payment_consent_id: 20,
            amount: &amount,
            currency: "RUB",
            creditor_identification: Some("40702810900000000001"),
        };

        assert!(!ReplayFingerprint { amount: &other_amount, ..base }.matches(&stored()));
        assert!(!ReplayFingerprint { debtor_account_id: 11, ..base }.matches(&stored()));
        assert!(
            !ReplayFingerprint {
                creditor_identification: Some("40702810900000000002"),
                ..base
            }
            .matches(&stored())
        );
    }

    #[test]
    fn test_detached_references_are_not_compared() {
        let amount = Decimal::from_str("250.00").unwrap();
        let mut payment = stored();
        payment.payment_consent_id = None;
        payment.debtor_account_id = None;

        let fingerprint = ReplayFingerprint {
            debtor_account_id: 99,
            payment_consent_id: 98,
            amount: &amount,
            currency: "RUB",
            creditor_identification: None,
        };
        assert!(fingerprint.matches(&payment));
    }
}
