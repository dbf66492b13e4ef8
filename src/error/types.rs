//! # 错误类型定义

use axum::http::StatusCode;
use thiserror::Error;

use super::payment::PaymentCheck;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum BridgeError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 认证错误（缺失或无效的令牌）
    #[error("认证错误: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 权限不足
    #[error("权限错误: {message}")]
    Forbidden { message: String },

    /// 请求参数验证错误
    #[error("验证错误: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// 资源不存在，或不属于当前调用者
    #[error("资源未找到: {resource_type} {identifier}")]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    /// 银行接口不可用：网络失败，或令牌/状态查询返回非成功
    #[error("银行 '{provider}' 不可用: {message}")]
    ProviderUnavailable {
        provider: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 银行明确拒绝了同意请求
    #[error("银行 '{provider}' 拒绝请求 (status={status:?}): {body}")]
    ProviderRejectedRequest {
        provider: String,
        status: Option<u16>,
        body: String,
    },

    /// 银行拒绝了支付
    #[error("银行 '{provider}' 支付失败 (status={status}): {body}")]
    ProviderPaymentError {
        provider: String,
        status: u16,
        body: String,
    },

    /// 支付前置检查失败，未发起任何网络请求
    #[error("支付请求无效 [{check}]: {message}")]
    InvalidPaymentRequest { check: PaymentCheck, message: String },

    /// 账户元数据缺失，无法解析账户标识
    #[error("账户数据不完整 (account={account_id}): {message}")]
    IncompleteAccountData { account_id: i32, message: String },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 附加了上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<BridgeError>,
    },
}

impl BridgeError {
    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Auth { .. } => (StatusCode::UNAUTHORIZED, "AUTH_ERROR"),
            Self::Forbidden { .. } => (StatusCode::FORBIDDEN, "PERMISSION_ERROR"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            Self::ProviderUnavailable { .. } => (StatusCode::BAD_GATEWAY, "PROVIDER_UNAVAILABLE"),
            Self::ProviderRejectedRequest { .. } => {
                (StatusCode::BAD_GATEWAY, "PROVIDER_REJECTED_REQUEST")
            }
            Self::ProviderPaymentError { status, .. } => {
                let code = StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (code, "PROVIDER_PAYMENT_ERROR")
            }
            // 归属检查失败与资源不存在不可区分
            Self::InvalidPaymentRequest { check, .. } if check.is_ownership() => {
                (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND")
            }
            Self::InvalidPaymentRequest { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_PAYMENT_REQUEST")
            }
            Self::IncompleteAccountData { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INCOMPLETE_ACCOUNT_DATA")
            }
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::Serialization { .. } => (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// 面向调用方的错误消息。归属检查失败时不暴露具体原因。
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidPaymentRequest { check, .. } if check.is_ownership() => {
                "资源未找到".to_string()
            }
            Self::Context { source, .. } => source.public_message(),
            other => other.to_string(),
        }
    }

    /// 去掉上下文包装，返回根错误
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建认证错误
    pub fn auth<T: Into<String>>(message: T) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的认证错误
    pub fn auth_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Auth {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// 创建验证错误
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// 创建指定字段的验证错误
    pub fn validation_field<T: Into<String>, F: Into<String>>(message: T, field: F) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn not_found<R: Into<String>, I: ToString>(resource_type: R, identifier: I) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.to_string(),
        }
    }

    /// 创建银行不可用错误
    pub fn provider_unavailable<P: Into<String>, T: Into<String>>(provider: P, message: T) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的银行不可用错误
    pub fn provider_unavailable_with_source<P, T, E>(provider: P, message: T, source: E) -> Self
    where
        P: Into<String>,
        T: Into<String>,
        E: Into<anyhow::Error>,
    {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn provider_rejected<P: Into<String>, B: Into<String>>(
        provider: P,
        status: Option<u16>,
        body: B,
    ) -> Self {
        Self::ProviderRejectedRequest {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }

    pub fn provider_payment<P: Into<String>, B: Into<String>>(
        provider: P,
        status: u16,
        body: B,
    ) -> Self {
        Self::ProviderPaymentError {
            provider: provider.into(),
            status,
            body: body.into(),
        }
    }

    /// 创建支付前置检查错误
    pub fn invalid_payment<T: Into<String>>(check: PaymentCheck, message: T) -> Self {
        Self::InvalidPaymentRequest {
            check,
            message: message.into(),
        }
    }

    pub fn incomplete_account_data<T: Into<String>>(account_id: i32, message: T) -> Self {
        Self::IncompleteAccountData {
            account_id,
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<sea_orm::error::DbErr> for BridgeError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::database_with_source("数据库操作失败", err)
    }
}

// JWT错误转换
impl From<jsonwebtoken::errors::Error> for BridgeError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::auth_with_source("JWT处理失败", err)
    }
}

impl From<rust_decimal::Error> for BridgeError {
    fn from(err: rust_decimal::Error) -> Self {
        Self::Validation {
            message: format!("金额格式无效: {err}"),
            field: Some("amount".to_string()),
        }
    }
}
