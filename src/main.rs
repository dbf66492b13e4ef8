//! # Open Banking Bridge 主程序
//!
//! 加载配置、初始化数据库与银行注册表，然后启动 HTTP 服务

use std::sync::Arc;

use openbank_bridge::{
    Result,
    app::AppContext,
    config::ConfigManager,
    database, lerror, linfo,
    logging::{self, LogComponent, LogStage},
    management::ManagementServer,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志系统
    logging::init_optimized_logging(None);

    let config_manager = ConfigManager::new()?;
    let config = config_manager.config();

    let db = database::init_database(&config.database).await?;
    database::run_migrations(&db).await?;
    database::check_database_status(&db).await?;

    let seeded = database::ensure_banks(&db, &config.banks).await?;
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "data_init_complete",
        &format!("数据初始化完成，新增 {seeded} 个银行配置")
    );

    let context = Arc::new(AppContext::build(Arc::clone(&config), db).await?);
    let server = ManagementServer::new(config.server.clone(), context);

    if let Err(e) = server.serve().await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        std::process::exit(1);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}
