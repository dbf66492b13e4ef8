//! # 银行令牌缓存
//!
//! 进程内按银行名缓存 Bearer 令牌。过期时间 = 获取时刻 + 银行声明有效期 − 安全余量。
//! 同一银行的并发缓存未命中会合并为一次获取：持有该银行的获取锁后再检查一次缓存。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use super::client::BankClient;
use super::clock::Clock;
use super::registry::BankProvider;
use crate::error::{BridgeError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo};

/// 默认安全余量（秒）
pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 60;

/// 缓存条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBankToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedBankToken {
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// 计算缓存过期时刻，有效期超出可表示范围时返回 `None`
#[must_use]
pub fn compute_expiry(
    now: DateTime<Utc>,
    expires_in_secs: i64,
    margin: Duration,
) -> Option<DateTime<Utc>> {
    now.checked_add_signed(Duration::try_seconds(expires_in_secs)?)?
        .checked_sub_signed(margin)
}

/// 银行令牌缓存
#[derive(Debug)]
pub struct BankTokenCache {
    client: BankClient,
    clock: Arc<dyn Clock>,
    safety_margin: Duration,
    entries: RwLock<HashMap<String, CachedBankToken>>,
    /// 获取锁：bank name -> Mutex，防止并发获取同一银行的令牌
    fetch_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl BankTokenCache {
    pub fn new(client: BankClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            clock,
            safety_margin: Duration::seconds(DEFAULT_SAFETY_MARGIN_SECS),
            entries: RwLock::new(HashMap::new()),
            fetch_locks: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_safety_margin(mut self, secs: i64) -> Self {
        if let Some(margin) = Duration::try_seconds(secs) {
            self.safety_margin = margin;
        }
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// 获取银行令牌：缓存命中直接返回，否则向银行获取并写入缓存
    ///
    /// 令牌接口返回非成功时以 `ProviderUnavailable` 失败，不做内部重试。
    pub async fn get_token(&self, provider: &BankProvider) -> Result<String> {
        if let Some(token) = self.cached(&provider.name).await {
            return Ok(token);
        }

        let lock = self.fetch_lock(&provider.name).await;
        let _guard = lock.lock().await;

        // 等待锁期间其他任务可能已经完成获取
        if let Some(token) = self.cached(&provider.name).await {
            ldebug!(
                "bank",
                LogStage::Cache,
                LogComponent::TokenCache,
                "coalesced_fetch",
                "并发获取已由其他任务完成",
                provider = provider.name
            );
            return Ok(token);
        }

        let fetched_at = self.clock.now();
        let response = self.client.fetch_token(provider).await?;
        let expires_at = compute_expiry(fetched_at, response.expires_in, self.safety_margin)
            .ok_or_else(|| {
                BridgeError::provider_unavailable(
                    &provider.name,
                    format!("令牌有效期超出范围: expires_in={}", response.expires_in),
                )
            })?;
        let entry = CachedBankToken {
            token: response.access_token,
            expires_at,
        };

        linfo!(
            "bank",
            LogStage::Cache,
            LogComponent::TokenCache,
            "token_refreshed",
            "已获取新的银行令牌",
            provider = provider.name,
            expires_at = entry.expires_at
        );

        let token = entry.token.clone();
        self.entries
            .write()
            .await
            .insert(provider.name.clone(), entry);
        Ok(token)
    }

    /// 丢弃某个银行的缓存令牌
    pub async fn invalidate(&self, provider_name: &str) {
        self.entries.write().await.remove(provider_name);
    }

    /// 当前缓存条目
    pub async fn entry(&self, provider_name: &str) -> Option<CachedBankToken> {
        self.entries.read().await.get(provider_name).cloned()
    }

    async fn cached(&self, provider_name: &str) -> Option<String> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(provider_name)
            .filter(|entry| entry.is_valid_at(now))
            .map(|entry| {
                ldebug!(
                    "bank",
                    LogStage::Cache,
                    LogComponent::TokenCache,
                    "cache_hit",
                    "银行令牌缓存命中",
                    provider = provider_name
                );
                entry.token.clone()
            })
    }

    async fn fetch_lock(&self, provider_name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.fetch_locks.lock().await;
        Arc::clone(
            locks
                .entry(provider_name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_subtracts_safety_margin() {
        let now = Utc::now();
        let expiry = compute_expiry(now, 3600, Duration::seconds(60));
        assert_eq!(expiry, Some(now + Duration::seconds(3540)));
    }

    #[test]
    fn test_short_lifetime_is_already_expired() {
        let now = Utc::now();
        let entry = CachedBankToken {
            token: "t".to_string(),
            expires_at: compute_expiry(now, 30, Duration::seconds(60)).unwrap(),
        };
        assert!(!entry.is_valid_at(now));
    }

    #[test]
    fn test_out_of_range_lifetime_has_no_expiry() {
        let now = Utc::now();
        assert_eq!(compute_expiry(now, i64::MAX, Duration::seconds(60)), None);
        assert_eq!(compute_expiry(now, i64::MAX / 1000, Duration::seconds(60)), None);
    }

    #[test]
    fn test_validity_boundary() {
        let now = Utc::now();
        let entry = CachedBankToken {
            token: "t".to_string(),
            expires_at: now + Duration::seconds(1),
        };
        assert!(entry.is_valid_at(now));
        assert!(!entry.is_valid_at(now + Duration::seconds(1)));
    }
}
