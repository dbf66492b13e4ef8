//! # 应用配置结构定义

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 数据库配置
    #[serde(default)]
    pub database: super::DatabaseConfig,
    /// API 认证配置
    #[serde(default)]
    pub auth: AuthConfig,
    /// 银行接口调用配置
    #[serde(default)]
    pub bank_api: BankApiConfig,
    /// 启动时写入注册表的银行
    #[serde(default)]
    pub banks: Vec<BankSeed>,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 路由前缀
    pub api_prefix: String,
    pub enable_cors: bool,
    /// 允许的跨域来源，为空时允许任意来源
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_prefix: "/api".to_string(),
            enable_cors: true,
            cors_origins: Vec::new(),
        }
    }
}

/// JWT 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// 令牌有效期（秒）
    pub token_ttl_secs: i64,
    pub issuer: String,
    pub audience: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 3600,
            issuer: "openbank-bridge".to_string(),
            audience: "openbank-bridge-api".to_string(),
        }
    }
}

/// 银行接口调用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BankApiConfig {
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 从银行声明的令牌有效期中扣除的安全余量（秒）
    pub token_safety_margin_secs: i64,
}

impl Default for BankApiConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            token_safety_margin_secs: 60,
        }
    }
}

/// 银行注册表种子数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSeed {
    pub name: String,
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub icon_filename: Option<String>,
}

impl AppConfig {
    /// 获取监听地址
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be greater than 0".to_string());
        }
        if !self.server.api_prefix.is_empty() && !self.server.api_prefix.starts_with('/') {
            return Err(format!(
                "server.api_prefix must start with '/': {}",
                self.server.api_prefix
            ));
        }

        // 验证数据库配置
        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        if self.auth.jwt_secret.trim().is_empty() {
            return Err("auth.jwt_secret cannot be empty".to_string());
        }
        if self.auth.token_ttl_secs <= 0 {
            return Err("auth.token_ttl_secs must be greater than 0".to_string());
        }

        if self.bank_api.request_timeout_secs == 0 {
            return Err("bank_api.request_timeout_secs must be greater than 0".to_string());
        }
        if self.bank_api.token_safety_margin_secs < 0 {
            return Err("bank_api.token_safety_margin_secs cannot be negative".to_string());
        }

        let mut names = HashSet::new();
        for bank in &self.banks {
            if bank.name.trim().is_empty() {
                return Err("bank name cannot be empty".to_string());
            }
            if !names.insert(bank.name.as_str()) {
                return Err(format!("duplicate bank name: {}", bank.name));
            }
            let url = url::Url::parse(&bank.base_url)
                .map_err(|e| format!("invalid base_url for bank {}: {e}", bank.name))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!(
                    "base_url for bank {} must be http or https",
                    bank.name
                ));
            }
            if bank.client_id.is_empty() {
                return Err(format!("client_id for bank {} cannot be empty", bank.name));
            }
        }

        Ok(())
    }
}
