//! # 错误处理
//!
//! 统一错误类型、上下文包装，以及按 HTTP 语义的错误分类

pub use payment::PaymentCheck;
pub use types::BridgeError;

/// 全局 `Result` 别名
pub type Result<T> = std::result::Result<T, BridgeError>;

pub mod macros;
pub mod payment;
pub mod types;

/// 为错误附加一段说明，原错误保留为 `source`
pub trait Context<T, E> {
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<BridgeError>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.with_context(|| context)
    }

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => {
                let context_message = context().to_string();
                Err(BridgeError::Context {
                    context: context_message,
                    source: Box::new(error.into()),
                })
            }
        }
    }
}

/// 错误分类，用于决定日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 调用方的问题，对应 4xx
    Client,
    /// 本服务或银行侧的问题，对应 5xx
    Server,
}

impl BridgeError {
    /// 按映射后的 HTTP 状态码分类
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        if self.to_http_response_parts().0.is_client_error() {
            ErrorCategory::Client
        } else {
            ErrorCategory::Server
        }
    }
}
