//! # 数据库模块
//!
//! 数据库连接、迁移和银行种子数据管理

use std::time::Duration;

use entity::{banks, users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, Set, SqlErr,
};
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::config::{BankSeed, DatabaseConfig};
use crate::error::{BridgeError, Result};
use crate::{linfo, logging::{LogComponent, LogStage}};

/// 初始化数据库连接
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let url = config.get_connection_url()?;
    info!(
        "正在连接数据库: {}",
        &url[..std::cmp::min(url.len(), 50)]
    );

    let mut options = ConnectOptions::new(url);
    // 内存数据库每个连接都是独立实例，只能使用单连接
    let max_connections = if config.is_memory_database() {
        1
    } else {
        config.max_connections
    };
    options
        .max_connections(max_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;

    info!("数据库连接成功");
    Ok(db)
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> std::result::Result<(), DbErr> {
    info!("开始运行数据库迁移...");

    match ::migration::Migrator::up(db, None).await {
        Ok(()) => {
            info!("数据库迁移完成");
            Ok(())
        }
        Err(e) => {
            error!("数据库迁移失败: {}", e);
            Err(e)
        }
    }
}

/// 检查数据库状态
pub async fn check_database_status(db: &DatabaseConnection) -> std::result::Result<(), DbErr> {
    let status = ::migration::Migrator::get_pending_migrations(db).await?;

    if status.is_empty() {
        info!("所有迁移都已应用");
    } else {
        warn!("有 {} 个待应用的迁移", status.len());
    }

    Ok(())
}

/// 确保配置中的银行存在于 `banks` 表
///
/// 已存在的同名银行保持不变：银行名一旦被同意记录引用就不可修改。
pub async fn ensure_banks(db: &DatabaseConnection, seeds: &[BankSeed]) -> Result<usize> {
    let mut inserted = 0;

    for seed in seeds {
        let existing = banks::Entity::find()
            .filter(banks::Column::Name.eq(&seed.name))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        banks::ActiveModel {
            name: Set(seed.name.clone()),
            base_url: Set(seed.base_url.trim_end_matches('/').to_string()),
            client_id: Set(seed.client_id.clone()),
            client_secret: Set(seed.client_secret.clone()),
            auto_approve: Set(seed.auto_approve),
            icon_filename: Set(seed.icon_filename.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        inserted += 1;
        linfo!("system", LogStage::Startup, LogComponent::Database, "seed_bank", &format!("写入银行配置: {}", seed.name), bank = seed.name);
    }

    Ok(inserted)
}

/// 查找用户，不存在时返回 `NotFound`
pub async fn find_user(db: &DatabaseConnection, user_id: i32) -> Result<users::Model> {
    users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| BridgeError::not_found("user", user_id))
}

/// 判断数据库错误是否为唯一约束冲突
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::PaginatorTrait;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..Default::default()
        }
    }

    fn seed(name: &str) -> BankSeed {
        BankSeed {
            name: name.to_string(),
            base_url: format!("https://{name}.example/"),
            client_id: "team-1".to_string(),
            client_secret: "secret".to_string(),
            auto_approve: false,
            icon_filename: None,
        }
    }

    #[tokio::test]
    async fn test_ensure_banks_is_idempotent() {
        let db = init_database(&memory_config()).await.unwrap();
        run_migrations(&db).await.unwrap();

        let seeds = vec![seed("vbank"), seed("abank")];
        assert_eq!(ensure_banks(&db, &seeds).await.unwrap(), 2);
        assert_eq!(ensure_banks(&db, &seeds).await.unwrap(), 0);
        assert_eq!(banks::Entity::find().count(&db).await.unwrap(), 2);

        let vbank = banks::Entity::find()
            .filter(banks::Column::Name.eq("vbank"))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(vbank.base_url, "https://vbank.example");
    }

    #[tokio::test]
    async fn test_find_user() {
        let db = init_database(&memory_config()).await.unwrap();
        run_migrations(&db).await.unwrap();

        let user = users::ActiveModel {
            email: Set("ivan@example.com".to_string()),
            is_admin: Set(false),
            created_at: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        assert_eq!(find_user(&db, user.id).await.unwrap().email, "ivan@example.com");
        let err = find_user(&db, user.id + 1).await.unwrap_err();
        assert!(matches!(err, BridgeError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unique_violation_detection() {
        let db = init_database(&memory_config()).await.unwrap();
        run_migrations(&db).await.unwrap();
        ensure_banks(&db, &[seed("vbank")]).await.unwrap();

        let err = banks::ActiveModel {
            name: Set("vbank".to_string()),
            base_url: Set("https://x.example".to_string()),
            client_id: Set("c".to_string()),
            client_secret: Set("s".to_string()),
            auto_approve: Set(false),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap_err();

        assert!(is_unique_violation(&err));
    }
}
