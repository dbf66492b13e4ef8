//! 应用上下文（DI 容器）
//!
//! 统一持有跨模块共享的服务实例，便于在测试中注入替身实现（例如手动时钟）。

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::accounts::AccountSyncService;
use crate::auth::JwtManager;
use crate::bank::{BankClient, BankTokenCache, Clock, ProviderRegistry, SystemClock};
use crate::config::AppConfig;
use crate::consent::{ConnectionService, PaymentConsentService};
use crate::error::Result;
use crate::payment::PaymentService;

#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub registry: Arc<ProviderRegistry>,
    pub tokens: Arc<BankTokenCache>,
    pub jwt: Arc<JwtManager>,
    pub connections: ConnectionService,
    pub payment_consents: PaymentConsentService,
    pub payments: PaymentService,
}

impl AppContext {
    /// 从数据库加载银行注册表并组装服务，使用系统时钟
    pub async fn build(config: Arc<AppConfig>, db: DatabaseConnection) -> Result<Self> {
        let registry = ProviderRegistry::load(&db).await?;
        Self::new(config, db, registry, Arc::new(SystemClock))
    }

    /// 用给定的注册表与时钟组装服务
    pub fn new(
        config: Arc<AppConfig>,
        db: DatabaseConnection,
        registry: ProviderRegistry,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let registry = Arc::new(registry);
        let client = BankClient::new(Duration::from_secs(config.bank_api.request_timeout_secs))?;
        let tokens = Arc::new(
            BankTokenCache::new(client.clone(), clock)
                .with_safety_margin(config.bank_api.token_safety_margin_secs),
        );
        let jwt = Arc::new(JwtManager::new(&config.auth)?);

        Ok(Self {
            connections: ConnectionService::new(db.clone(), registry.clone(), client.clone(), tokens.clone()),
            payment_consents: PaymentConsentService::new(db.clone(), registry.clone(), client.clone(), tokens.clone()),
            payments: PaymentService::new(db.clone(), registry.clone(), client, tokens.clone()),
            config,
            db,
            registry,
            tokens,
            jwt,
        })
    }

    #[must_use]
    pub const fn accounts(&self) -> &AccountSyncService {
        self.connections.accounts()
    }
}
