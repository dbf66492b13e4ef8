//! 支付前置检查的分类

use std::fmt;

use serde::Serialize;

/// 失败的支付前置检查
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentCheck {
    /// 付款账户不属于当前用户
    DebtorAccountOwnership,
    /// 收款账户不属于当前用户（内部转账）
    CreditorAccountOwnership,
    /// 支付同意不属于当前用户
    ConsentOwnership,
    /// 支付同意状态不是 approved
    ConsentNotApproved,
    /// 支付同意缺少银行侧 consent_id
    ConsentIdMissing,
    /// 付款账户与支付同意不属于同一银行
    ProviderMismatch,
    /// 金额不是正数，或超过两位小数
    InvalidAmount,
    InvalidCurrency,
    /// 幂等键已被其他用户使用
    IdempotencyKeyConflict,
    /// 幂等键已用于内容不同的支付请求
    IdempotencyPayloadMismatch,
}

impl PaymentCheck {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DebtorAccountOwnership => "debtor_account_ownership",
            Self::CreditorAccountOwnership => "creditor_account_ownership",
            Self::ConsentOwnership => "consent_ownership",
            Self::ConsentNotApproved => "consent_not_approved",
            Self::ConsentIdMissing => "consent_id_missing",
            Self::ProviderMismatch => "provider_mismatch",
            Self::InvalidAmount => "invalid_amount",
            Self::InvalidCurrency => "invalid_currency",
            Self::IdempotencyKeyConflict => "idempotency_key_conflict",
            Self::IdempotencyPayloadMismatch => "idempotency_payload_mismatch",
        }
    }

    /// 归属类检查，对外表现为资源不存在
    #[must_use]
    pub const fn is_ownership(self) -> bool {
        matches!(
            self,
            Self::DebtorAccountOwnership
                | Self::CreditorAccountOwnership
                | Self::ConsentOwnership
                | Self::IdempotencyKeyConflict
        )
    }
}

impl fmt::Display for PaymentCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
