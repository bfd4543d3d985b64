//! 餐厅员工与反馈管理后台服务
//!
//! 提供用户、注册审批、反馈、分类体系、统计与推送目标管理的 REST API。

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::Response,
};
use feedback_core::notification::{
    JsonFileDestinationStore, TelegramTransport, email_transport_from_config,
};
use hrm_admin_api::{
    routes,
    state::{AppState, Repositories, Transports},
};
use hrm_shared::{
    config::AppConfig,
    database::Database,
    observability::{self, middleware as obs_middleware},
};
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};

const SERVICE_NAME: &str = "hrm-admin";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 配置来源：config/*.toml 与 HRM_ 前缀环境变量
    let config = AppConfig::load(SERVICE_NAME)?;
    config.validate()?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting {} on {}", SERVICE_NAME, config.server_addr());

    let db = Database::connect(&config.database).await?;
    if config.database.run_migrations {
        db.run_migrations().await?;
    }

    let http_client = reqwest::Client::new();
    let transports = Transports {
        destinations: Arc::new(JsonFileDestinationStore::new(
            &config.telegram.destinations_file,
        )),
        messages: Arc::new(TelegramTransport::new(http_client.clone(), &config.telegram)),
        email: email_transport_from_config(http_client, &config.email),
    };
    if config.telegram.bot_token.is_empty() {
        warn!("未配置 Telegram bot token，反馈推送将全部失败");
    }

    let state = AppState::new(&config, Repositories::postgres(db.pool()), transports)
        .with_database(db.clone());

    let app = routes::app_router(state)
        .layer(middleware::from_fn(security_headers))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&config))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 收到 SIGTERM 或 Ctrl+C 后停止接收新连接，等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// CORS 配置：`*` 放行全部来源，否则按逗号分隔的白名单
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let allowed_origins = config.server.cors_origins.trim();

    if allowed_origins == "*" {
        if config.is_production() {
            warn!("cors_origins=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        info!("CORS allowed_origins: * (all origins)");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 为所有响应注入 HTTP 安全头
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    // 旧的 XSS 过滤器显式关闭
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));
    response
}

/// 监听关闭信号
///
/// 信号处理器注册失败时只记录日志，该信号源永不触发。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
