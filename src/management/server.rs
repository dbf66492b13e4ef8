//! # 管理服务器
//!
//! Axum HTTP服务器，对外提供同意、账户与支付 API

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app::AppContext;
use crate::config::ServerConfig;
use crate::error::{BridgeError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 管理服务器应用状态
#[derive(Debug, Clone)]
pub struct AppState {
    context: Arc<AppContext>,
}

impl AppState {
    #[must_use]
    pub const fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    #[must_use]
    pub const fn context_arc(&self) -> &Arc<AppContext> {
        &self.context
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// 管理服务器
pub struct ManagementServer {
    config: ServerConfig,
    router: Router,
}

impl ManagementServer {
    /// 创建新的管理服务器
    #[must_use]
    pub fn new(config: ServerConfig, context: Arc<AppContext>) -> Self {
        let router = Self::create_router(AppState::new(context), &config);
        Self { config, router }
    }

    /// 创建路由器
    pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
        let api_routes = super::routes::create_routes(state);

        let mut app = Router::new()
            .nest(&config.api_prefix, api_routes)
            .route("/ping", get(super::handlers::system::ping_handler));

        let service_builder = ServiceBuilder::new().layer(TraceLayer::new_for_http());

        // 配置CORS
        if config.enable_cors {
            let mut cors_layer = CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::ACCEPT,
                    axum::http::header::ORIGIN,
                ]);

            if config.cors_origins.iter().any(|origin| origin == "*") {
                cors_layer = cors_layer.allow_origin(Any);
            } else {
                let origins = config
                    .cors_origins
                    .iter()
                    .map(|origin| origin.parse::<axum::http::HeaderValue>())
                    .collect::<std::result::Result<Vec<_>, _>>();

                match origins {
                    Ok(origins) => cors_layer = cors_layer.allow_origin(origins),
                    Err(e) => {
                        lwarn!(
                            "system",
                            LogStage::Startup,
                            LogComponent::ServerSetup,
                            "cors_config_fail",
                            &format!("Invalid CORS origin configuration: {e}, falling back to allow any")
                        );
                        cors_layer = cors_layer.allow_origin(Any);
                    }
                }
            }

            app = app.layer(service_builder.layer(cors_layer));
        } else {
            app = app.layer(service_builder);
        }

        app
    }

    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// 启动服务器，收到 Ctrl+C 后优雅退出
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| {
                BridgeError::config_with_source(
                    format!("无效的监听地址 {}:{}", self.config.host, self.config.port),
                    e,
                )
            })?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("Starting server on {addr}")
        );

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        linfo!("system", LogStage::Shutdown, LogComponent::ServerSetup, "server_stop", "Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        lwarn!("system", LogStage::Shutdown, LogComponent::ServerSetup, "signal", "无法监听 Ctrl+C 信号");
        std::future::pending::<()>().await;
    }
}
