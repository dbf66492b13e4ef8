//! # 同意撤销协调器
//!
//! 删除本地记录前尽力通知银行。撤销结果只记录日志，不向调用方返回错误：
//! 本地记录是“是否仍然连接”的唯一依据。

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Serialize;

use super::status::ConsentKind;
use crate::bank::client::RawResponse;
use crate::bank::{BankClient, BankProvider, BankTokenCache};
use crate::error::Result;
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 撤销结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevocationOutcome {
    /// 本地没有任何银行侧标识，未发起请求
    Skipped,
    /// 银行确认已撤销
    Revoked { id: String },
    /// 银行返回 404，视为已撤销
    AlreadyGone { id: String },
    /// 银行返回其他结果或请求失败，已记录日志
    Failed { id: String, reason: String },
}

impl RevocationOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Revoked { .. } | Self::AlreadyGone { .. })
    }
}

/// 选择撤销使用的标识：已确认的 `consent_id` 优先
#[must_use]
pub fn revocation_target<'a>(
    request_id: Option<&'a str>,
    consent_id: Option<&'a str>,
) -> Option<&'a str> {
    consent_id
        .filter(|id| !id.is_empty())
        .or_else(|| request_id.filter(|id| !id.is_empty()))
}

/// 撤销协调器
#[derive(Debug, Clone)]
pub struct RevocationCoordinator {
    client: BankClient,
    tokens: Arc<BankTokenCache>,
}

impl RevocationCoordinator {
    #[must_use]
    pub const fn new(client: BankClient, tokens: Arc<BankTokenCache>) -> Self {
        Self { client, tokens }
    }

    /// 尽力撤销银行侧的同意
    ///
    /// 账户同意只带客户端标识头，支付同意需要 Bearer 令牌。
    pub async fn revoke(
        &self,
        kind: ConsentKind,
        provider: &BankProvider,
        request_id: Option<&str>,
        consent_id: Option<&str>,
    ) -> RevocationOutcome {
        let Some(id) = revocation_target(request_id, consent_id) else {
            linfo!(
                "revoke",
                LogStage::ExternalApi,
                LogComponent::Revocation,
                "skip",
                "记录没有银行侧标识，跳过撤销",
                provider = provider.name,
                kind = kind.as_str()
            );
            return RevocationOutcome::Skipped;
        };

        let outcome = match self.send(kind, provider, id).await {
            Ok(raw) => classify(id, &raw),
            Err(e) => RevocationOutcome::Failed {
                id: id.to_string(),
                reason: e.to_string(),
            },
        };

        if let RevocationOutcome::Failed { reason, .. } = &outcome {
            lwarn!(
                "revoke",
                LogStage::ExternalApi,
                LogComponent::Revocation,
                "revoke_failed",
                &format!("撤销银行同意失败，继续删除本地记录: {reason}"),
                provider = provider.name,
                kind = kind.as_str(),
                id = id
            );
        } else {
            linfo!(
                "revoke",
                LogStage::ExternalApi,
                LogComponent::Revocation,
                "revoked",
                "银行同意已撤销",
                provider = provider.name,
                kind = kind.as_str(),
                id = id
            );
        }

        outcome
    }

    async fn send(&self, kind: ConsentKind, provider: &BankProvider, id: &str) -> Result<RawResponse> {
        match kind {
            ConsentKind::Account => self.client.delete_account_consent(provider, id).await,
            ConsentKind::Payment => {
                let token = self.tokens.get_token(provider).await?;
                self.client.delete_payment_consent(provider, &token, id).await
            }
        }
    }
}

fn classify(id: &str, raw: &RawResponse) -> RevocationOutcome {
    if raw.status == StatusCode::NOT_FOUND {
        RevocationOutcome::AlreadyGone { id: id.to_string() }
    } else if raw.status.is_success() {
        RevocationOutcome::Revoked { id: id.to_string() }
    } else {
        RevocationOutcome::Failed {
            id: id.to_string(),
            reason: format!("status={}, body={}", raw.status, raw.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consent_id_preferred() {
        assert_eq!(revocation_target(Some("r-1"), Some("c-1")), Some("c-1"));
        assert_eq!(revocation_target(Some("r-1"), None), Some("r-1"));
        assert_eq!(revocation_target(Some("r-1"), Some("")), Some("r-1"));
        assert_eq!(revocation_target(None, None), None);
    }

    #[test]
    fn test_classify_statuses() {
        let raw = |status: u16| RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: "oops".to_string(),
        };

        assert_eq!(
            classify("c-1", &raw(204)),
            RevocationOutcome::Revoked { id: "c-1".to_string() }
        );
        assert_eq!(
            classify("c-1", &raw(404)),
            RevocationOutcome::AlreadyGone { id: "c-1".to_string() }
        );
        let failed = classify("c-1", &raw(500));
        assert!(!failed.is_success());
        assert!(matches!(failed, RevocationOutcome::Failed { reason, .. } if reason.contains("oops")));
    }
}
