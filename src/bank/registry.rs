//! # 银行注册表
//!
//! 进程启动时从 `banks` 表加载一次，之后只读。按银行名索引。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use entity::banks;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;

use crate::error::{BridgeError, Result};
use crate::{linfo, logging::{LogComponent, LogStage}};

/// 一个已配置的 Open Banking 提供方
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct BankProvider {
    pub name: String,
    /// 不带结尾斜杠的基础地址
    pub base_url: String,
    /// 本服务在该银行的客户端标识，同时作为 `X-Requesting-Bank`
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub auto_approve: bool,
    pub icon_filename: Option<String>,
}

impl BankProvider {
    /// 拼接接口地址
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

// 避免在日志中输出 client_secret
impl fmt::Debug for BankProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankProvider")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("auto_approve", &self.auto_approve)
            .finish_non_exhaustive()
    }
}

impl From<banks::Model> for BankProvider {
    fn from(model: banks::Model) -> Self {
        Self {
            name: model.name,
            base_url: model.base_url.trim().trim_end_matches('/').to_string(),
            client_id: model.client_id,
            client_secret: model.client_secret,
            auto_approve: model.auto_approve,
            icon_filename: model.icon_filename,
        }
    }
}

/// 只读的银行注册表
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<BankProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn from_providers(providers: impl IntoIterator<Item = BankProvider>) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|p| (p.name.clone(), Arc::new(p)))
                .collect(),
        }
    }

    /// 从数据库加载
    pub async fn load(db: &DatabaseConnection) -> Result<Self> {
        let rows = banks::Entity::find().all(db).await?;
        let registry = Self::from_providers(rows.into_iter().map(BankProvider::from));

        linfo!("system", LogStage::Startup, LogComponent::Registry, "load", &format!("加载 {} 个银行配置", registry.len()));
        Ok(registry)
    }

    /// 按名称查找，不存在时返回 `NotFound`
    pub fn get(&self, name: &str) -> Result<Arc<BankProvider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| BridgeError::not_found("bank", name))
    }

    pub fn list(&self) -> impl Iterator<Item = &Arc<BankProvider>> {
        self.providers.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
