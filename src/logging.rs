//! # 日志配置模块
//!
//! 基于 `tracing` 的结构化日志：统一的初始化入口，以及带阶段/组件字段的 `linfo!` 等宏。

use std::{env, fmt};
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Configuration,
    Authentication,
    /// 调用银行接口
    ExternalApi,
    Db,
    Cache,
    BackgroundTask,
    Internal,
    Error,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::Authentication => "authentication",
            Self::ExternalApi => "external_api",
            Self::Db => "db",
            Self::Cache => "cache",
            Self::BackgroundTask => "background_task",
            Self::Internal => "internal",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    ServerSetup,
    Config,
    Database,
    Registry,
    /// 银行 HTTP 客户端
    BankClient,
    TokenCache,
    /// 账户访问同意 / 支付同意状态机
    Consent,
    Revocation,
    Payment,
    AccountSync,
    Auth,
    Management,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::ServerSetup => "server_setup",
            Self::Config => "config",
            Self::Database => "database",
            Self::Registry => "registry",
            Self::BankClient => "bank_client",
            Self::TokenCache => "token_cache",
            Self::Consent => "consent",
            Self::Revocation => "revocation",
            Self::Payment => "payment",
            Self::AccountSync => "account_sync",
            Self::Auth => "auth",
            Self::Management => "management",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 内部宏：按级别输出一条结构化日志
#[doc(hidden)]
#[macro_export]
macro_rules! __log_event {
    ($level:expr, $request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::event!(
            $level,
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = ?$value,)*
            "{}",
            $message
        )
    };
}

/// INFO 级结构化日志
#[macro_export]
macro_rules! linfo {
    ($($args:tt)*) => {
        $crate::__log_event!(::tracing::Level::INFO, $($args)*)
    };
}

/// WARN 级结构化日志
#[macro_export]
macro_rules! lwarn {
    ($($args:tt)*) => {
        $crate::__log_event!(::tracing::Level::WARN, $($args)*)
    };
}

/// ERROR 级结构化日志
#[macro_export]
macro_rules! lerror {
    ($($args:tt)*) => {
        $crate::__log_event!(::tracing::Level::ERROR, $($args)*)
    };
}

/// DEBUG 级结构化日志
#[macro_export]
macro_rules! ldebug {
    ($($args:tt)*) => {
        $crate::__log_event!(::tracing::Level::DEBUG, $($args)*)
    };
}

/// 默认过滤规则：禁止数据库查询的详细日志
fn default_filter(level: &str) -> String {
    format!("{level},openbank_bridge=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn")
}

/// 初始化优化的日志系统
///
/// `RUST_LOG` 优先于传入的级别。重复初始化时静默忽略。
pub fn init_optimized_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(level));

    let initialized = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&log_filter).unwrap_or_else(|_| EnvFilter::new(default_filter("info"))))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init()
        .is_ok();

    if initialized {
        tracing::info!(filter = %log_filter, "logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_silences_sql() {
        let filter = default_filter("warn");
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("sqlx::query=off"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_log_macros_expand() {
        // 未安装订阅者时宏依然可用
        let provider = "vbank";
        crate::linfo!("req-1", LogStage::Cache, LogComponent::TokenCache, "hit", "cache hit", provider = provider);
        crate::lwarn!("req-1", LogStage::ExternalApi, LogComponent::Revocation, "revoke", &format!("status {}", 500));
        assert_eq!(LogStage::ExternalApi.to_string(), "external_api");
        assert_eq!(LogComponent::AccountSync.as_str(), "account_sync");
    }
}
