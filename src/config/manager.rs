//! # 配置管理器
//!
//! 统一的配置加载入口：读取 TOML 文件、应用环境变量覆盖并验证。
//! 配置在进程启动时加载一次，之后只读。

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::AppConfig;
use crate::ensure_config;
use crate::error::{BridgeError, Result};

/// 环境变量覆盖前缀，例如 `BRIDGE_SERVER_PORT` -> `server.port`
const ENV_PREFIX: &str = "BRIDGE_";

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: Arc<AppConfig>,
    /// 已应用的覆盖项数量
    overrides_applied: usize,
}

impl ConfigManager {
    /// 创建配置管理器
    pub fn new() -> Result<Self> {
        // 优先使用环境变量指定的配置文件路径
        let config_file = if let Ok(path) = env::var("OPENBANK_BRIDGE_CONFIG_PATH") {
            path
        } else {
            let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
            format!("config/config.{env}.toml")
        };

        Self::from_file(&config_file)
    }

    /// 从指定文件创建配置管理器
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let overrides = Self::build_env_overrides(env::vars());
        let config = Self::load_config_file(config_path, &overrides)?;

        info!(
            path = %config_path.display(),
            overrides = overrides.len(),
            banks = config.banks.len(),
            "配置加载完成"
        );

        Ok(Self {
            config: Arc::new(config),
            overrides_applied: overrides.len(),
        })
    }

    /// 直接使用内存中的配置（测试与嵌入场景）
    pub fn from_config(config: AppConfig) -> Result<Self> {
        config.validate().map_err(BridgeError::config)?;
        Ok(Self {
            config: Arc::new(config),
            overrides_applied: 0,
        })
    }

    /// 获取当前配置
    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    pub const fn overrides_applied(&self) -> usize {
        self.overrides_applied
    }

    /// 加载配置文件
    fn load_config_file(path: &Path, overrides: &HashMap<String, String>) -> Result<AppConfig> {
        ensure_config!(path.exists(), "配置文件不存在: {}", path.display());

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        Self::parse(&config_content, overrides)
    }

    /// 解析配置文本并应用覆盖
    pub fn parse(content: &str, overrides: &HashMap<String, String>) -> Result<AppConfig> {
        let mut config: AppConfig = toml::from_str(content)
            .map_err(|e| BridgeError::config_with_source(format!("TOML解析失败: {e}"), e))?;

        Self::apply_env_overrides(&mut config, overrides)?;

        config.validate().map_err(BridgeError::config)?;
        Ok(config)
    }

    /// 构建环境变量覆盖映射
    pub fn build_env_overrides<I>(vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let overrides: HashMap<String, String> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|config_key| (config_key.to_lowercase(), value))
            })
            .collect();

        debug!("发现 {} 个环境变量覆盖", overrides.len());
        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (key, value) in overrides {
            debug!(
                "应用环境变量覆盖: {} = {}",
                key,
                if key.contains("secret") { "***" } else { value }
            );

            Self::apply_override_to_config(config, key, value)?;
        }
        Ok(())
    }

    /// 将单个覆盖项应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, key: &str, value: &str) -> Result<()> {
        match key {
            "server_host" => config.server.host = value.to_string(),
            "server_port" => config.server.port = parse_value(key, value)?,
            "database_url" => config.database.url = value.to_string(),
            "database_max_connections" => {
                config.database.max_connections = parse_value(key, value)?;
            }
            "auth_jwt_secret" => config.auth.jwt_secret = value.to_string(),
            "auth_token_ttl_secs" => config.auth.token_ttl_secs = parse_value(key, value)?,
            "bank_api_request_timeout_secs" => {
                config.bank_api.request_timeout_secs = parse_value(key, value)?;
            }
            "bank_api_token_safety_margin_secs" => {
                config.bank_api.token_safety_margin_secs = parse_value(key, value)?;
            }
            _ => {
                warn!("未知的配置项，忽略环境变量覆盖: {}{}", ENV_PREFIX, key.to_uppercase());
            }
        }

        Ok(())
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| {
        BridgeError::config_with_source(format!("无效的配置值 {key}: {value}"), e)
    })
}
