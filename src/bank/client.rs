//! # 银行 HTTP 客户端
//!
//! 封装各银行 Open Banking 接口的调用约定：路径、认证头、查询参数，
//! 以及把非成功响应映射为对应的错误类型。客户端本身不做重试。

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use super::registry::BankProvider;
use super::types::{ConsentResponse, PaymentStatusResponse, RemoteAccount, TokenResponse, parse_accounts};
use crate::error::{BridgeError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lwarn};

/// 发起方在银行的客户端标识
pub const REQUESTING_BANK_HEADER: &str = "X-Requesting-Bank";
pub const CONSENT_ID_HEADER: &str = "X-Consent-Id";
pub const PAYMENT_CONSENT_ID_HEADER: &str = "X-Payment-Consent-Id";
pub const IDEMPOTENCY_KEY_HEADER: &str = "X-Idempotency-Key";
/// 账户同意的轻量认证头，同时用于支付的交互追踪
pub const INTERACTION_ID_HEADER: &str = "X-Fapi-Interaction-Id";

/// 账户访问同意查询的认证方式
#[derive(Debug, Clone, Copy)]
pub enum ConsentAuth<'a> {
    /// 授权前按 request_id 查询，需要 Bearer 令牌
    Bearer(&'a str),
    /// 授权后按 consent_id 查询，只需要客户端标识头
    ClientHeader,
}

/// 一次银行调用的原始结果
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    fn json(&self, provider: &str) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&self.body).map_err(|e| {
            BridgeError::provider_unavailable_with_source(provider, "银行返回了无法解析的响应", e)
        })
    }
}

/// 银行接口客户端
#[derive(Debug, Clone)]
pub struct BankClient {
    http: Client,
}

impl BankClient {
    /// 创建带请求超时的客户端
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::config_with_source("创建HTTP客户端失败", e))?;
        Ok(Self { http })
    }

    /// 发送请求。传输层失败统一映射为 `ProviderUnavailable`。
    async fn send(
        &self,
        provider: &BankProvider,
        operation: &str,
        request: RequestBuilder,
    ) -> Result<RawResponse> {
        let response = request.send().await.map_err(|e| {
            lwarn!(
                "bank",
                LogStage::ExternalApi,
                LogComponent::BankClient,
                operation,
                &format!("银行请求失败: {e}"),
                provider = provider.name
            );
            BridgeError::provider_unavailable_with_source(&provider.name, format!("{operation} 请求失败"), e)
        })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        ldebug!(
            "bank",
            LogStage::ExternalApi,
            LogComponent::BankClient,
            operation,
            &format!("银行响应: {status}"),
            provider = provider.name,
            status = status.as_u16()
        );

        Ok(RawResponse { status, body })
    }

    /// 获取银行访问令牌：`POST /auth/bank-token?client_id&client_secret`
    pub async fn fetch_token(&self, provider: &BankProvider) -> Result<TokenResponse> {
        let request = self.http.post(provider.endpoint("/auth/bank-token")).query(&[
            ("client_id", provider.client_id.as_str()),
            ("client_secret", provider.client_secret.as_str()),
        ]);

        let raw = self.send(provider, "fetch_token", request).await?;
        if !raw.status.is_success() {
            return Err(BridgeError::provider_unavailable(
                &provider.name,
                format!("获取银行令牌失败: status={}, body={}", raw.status, raw.body),
            ));
        }

        serde_json::from_str(&raw.body).map_err(|e| {
            BridgeError::provider_unavailable_with_source(&provider.name, "令牌响应格式无效", e)
        })
    }

    /// 创建账户访问同意：`POST /account-consents/request`
    pub async fn request_account_consent(
        &self,
        provider: &BankProvider,
        token: &str,
        body: &Value,
    ) -> Result<ConsentResponse> {
        let request = self
            .http
            .post(provider.endpoint("/account-consents/request"))
            .bearer_auth(token)
            .header(REQUESTING_BANK_HEADER, &provider.client_id)
            .json(body);

        let raw = self.send(provider, "request_account_consent", request).await?;
        Self::consent_or_rejected(provider, &raw)
    }

    /// 查询账户访问同意：`GET /account-consents/{id}`
    pub async fn get_account_consent(
        &self,
        provider: &BankProvider,
        id: &str,
        auth: ConsentAuth<'_>,
    ) -> Result<ConsentResponse> {
        let url = provider.endpoint(&format!("/account-consents/{id}"));
        let request = match auth {
            ConsentAuth::Bearer(token) => self
                .http
                .get(url)
                .bearer_auth(token)
                .header(REQUESTING_BANK_HEADER, &provider.client_id),
            ConsentAuth::ClientHeader => self
                .http
                .get(url)
                .header(INTERACTION_ID_HEADER, &provider.client_id),
        };

        let raw = self.send(provider, "get_account_consent", request).await?;
        Self::consent_or_unavailable(provider, &raw)
    }

    /// 撤销账户访问同意：`DELETE /account-consents/{id}`，不需要令牌
    pub async fn delete_account_consent(
        &self,
        provider: &BankProvider,
        id: &str,
    ) -> Result<RawResponse> {
        let request = self
            .http
            .delete(provider.endpoint(&format!("/account-consents/{id}")))
            .header(INTERACTION_ID_HEADER, &provider.client_id);

        self.send(provider, "delete_account_consent", request).await
    }

    /// 创建支付同意：`POST /payment-consents/request`
    pub async fn request_payment_consent(
        &self,
        provider: &BankProvider,
        token: &str,
        body: &Value,
    ) -> Result<ConsentResponse> {
        let request = self
            .http
            .post(provider.endpoint("/payment-consents/request"))
            .bearer_auth(token)
            .header(REQUESTING_BANK_HEADER, &provider.client_id)
            .json(body);

        let raw = self.send(provider, "request_payment_consent", request).await?;
        Self::consent_or_rejected(provider, &raw)
    }

    /// 查询支付同意：`GET /payment-consents/{id}`
    pub async fn get_payment_consent(
        &self,
        provider: &BankProvider,
        token: &str,
        id: &str,
    ) -> Result<ConsentResponse> {
        let request = self
            .http
            .get(provider.endpoint(&format!("/payment-consents/{id}")))
            .bearer_auth(token);

        let raw = self.send(provider, "get_payment_consent", request).await?;
        Self::consent_or_unavailable(provider, &raw)
    }

    /// 撤销支付同意：`DELETE /payment-consents/{id}`
    pub async fn delete_payment_consent(
        &self,
        provider: &BankProvider,
        token: &str,
        id: &str,
    ) -> Result<RawResponse> {
        let request = self
            .http
            .delete(provider.endpoint(&format!("/payment-consents/{id}")))
            .bearer_auth(token);

        self.send(provider, "delete_payment_consent", request).await
    }

    /// 拉取账户列表：`GET /accounts?client_id=…`
    pub async fn fetch_accounts(
        &self,
        provider: &BankProvider,
        token: &str,
        consent_id: &str,
        bank_client_id: &str,
    ) -> Result<Vec<RemoteAccount>> {
        let request = self
            .http
            .get(provider.endpoint("/accounts"))
            .bearer_auth(token)
            .header(REQUESTING_BANK_HEADER, &provider.client_id)
            .header(CONSENT_ID_HEADER, consent_id)
            .query(&[("client_id", bank_client_id)]);

        let raw = self.send(provider, "fetch_accounts", request).await?;
        if !raw.status.is_success() {
            return Err(BridgeError::provider_unavailable(
                &provider.name,
                format!("获取账户列表失败: status={}, body={}", raw.status, raw.body),
            ));
        }

        Ok(parse_accounts(&raw.json(&provider.name)?))
    }

    /// 发起支付：`POST /payments?client_id=…`
    ///
    /// 幂等键同时作为交互追踪标识发送。
    pub async fn create_payment(
        &self,
        provider: &BankProvider,
        token: &str,
        consent_id: &str,
        idempotency_key: &str,
        debtor_client_id: &str,
        body: &Value,
    ) -> Result<PaymentStatusResponse> {
        let request = self
            .http
            .post(provider.endpoint("/payments"))
            .bearer_auth(token)
            .header(REQUESTING_BANK_HEADER, &provider.client_id)
            .header(PAYMENT_CONSENT_ID_HEADER, consent_id)
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key)
            .header(INTERACTION_ID_HEADER, idempotency_key)
            .query(&[("client_id", debtor_client_id)])
            .json(body);

        let raw = self.send(provider, "create_payment", request).await?;
        if !raw.status.is_success() {
            return Err(BridgeError::provider_payment(
                &provider.name,
                raw.status.as_u16(),
                raw.body,
            ));
        }

        Ok(PaymentStatusResponse::from_value(&raw.json(&provider.name)?))
    }

    /// 查询支付状态：`GET /payments/{id}?client_id=…`
    pub async fn get_payment(
        &self,
        provider: &BankProvider,
        token: &str,
        payment_id: &str,
        debtor_client_id: &str,
    ) -> Result<PaymentStatusResponse> {
        let request = self
            .http
            .get(provider.endpoint(&format!("/payments/{payment_id}")))
            .bearer_auth(token)
            .query(&[("client_id", debtor_client_id)]);

        let raw = self.send(provider, "get_payment", request).await?;
        if !raw.status.is_success() {
            return Err(BridgeError::provider_unavailable(
                &provider.name,
                format!("查询支付状态失败: status={}, body={}", raw.status, raw.body),
            ));
        }

        Ok(PaymentStatusResponse::from_value(&raw.json(&provider.name)?))
    }

    /// 创建类接口：非成功视为银行拒绝，并回显响应体
    fn consent_or_rejected(provider: &BankProvider, raw: &RawResponse) -> Result<ConsentResponse> {
        if !raw.status.is_success() {
            return Err(BridgeError::provider_rejected(
                &provider.name,
                Some(raw.status.as_u16()),
                raw.body.clone(),
            ));
        }
        Ok(ConsentResponse::from_value(&raw.json(&provider.name)?))
    }

    /// 查询类接口：非成功视为银行不可用
    fn consent_or_unavailable(
        provider: &BankProvider,
        raw: &RawResponse,
    ) -> Result<ConsentResponse> {
        if !raw.status.is_success() {
            return Err(BridgeError::provider_unavailable(
                &provider.name,
                format!("查询同意状态失败: status={}, body={}", raw.status, raw.body),
            ));
        }
        Ok(ConsentResponse::from_value(&raw.json(&provider.name)?))
    }
}
