//! # 管理服务器
//!
//! Axum HTTP服务器：API 路由挂在 `api_prefix` 下，外层叠加 CORS、追踪与请求 ID。

use crate::app::context::AppContext;
use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::request_id_middleware;

/// 管理服务器应用状态
#[derive(Clone)]
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
    #[must_use]
    pub fn new(context: Arc<AppContext>) -> Self {
        let config = context.config.server.clone();
        let router = build_router(context);
        Self { config, router }
    }

    /// 启动服务器，`shutdown` 完成后优雅退出
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_address().map_err(|e| {
            AppError::config_with_source(
                format!("Invalid bind address '{}'", self.config.host),
                e,
            )
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::server_start_with_source(format!("Failed to bind {addr}"), e))?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("HTTP server listening on {addr}"),
            api_prefix = %self.config.api_prefix
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| AppError::server_start_with_source("HTTP server error", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stopped",
            "HTTP server stopped"
        );
        Ok(())
    }
}

/// 构建完整路由，集成测试直接使用
pub fn build_router(context: Arc<AppContext>) -> Router {
    let config = context.config.server.clone();
    let state = AppState::new(context);

    let mut app = Router::new()
        .nest(&config.api_prefix, super::routes::create_routes(state))
        .route("/ping", get(crate::management::handlers::system::ping));

    let service_builder = ServiceBuilder::new().layer(TraceLayer::new_for_http());
    if config.enable_cors {
        app = app.layer(service_builder.layer(cors_layer(&config.cors_origins)));
    } else {
        app = app.layer(service_builder);
    }

    app.layer(axum::middleware::from_fn(request_id_middleware))
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    let cors_layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
        ]);

    if cors_origins.iter().any(|origin| origin == "*") {
        return cors_layer.allow_origin(Any);
    }

    let origins = cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>();

    match origins {
        Ok(origins) => cors_layer.allow_origin(origins).allow_credentials(true),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("Invalid CORS origin configuration: {e}, falling back to allow any")
            );
            cors_layer.allow_origin(Any)
        }
    }
}
