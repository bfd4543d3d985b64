//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// 全局 Prometheus handle，用于渲染指标
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROMETHEUS_HANDLE.set(handle.clone());

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册业务指标描述（出现在 /metrics 的 HELP 注释中）
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("feedbacks_created_total", "Total number of created feedbacks");
    metrics::describe_counter!(
        "notification_deliveries_total",
        "Telegram delivery attempts by outcome"
    );
    metrics::describe_histogram!(
        "notification_fanout_duration_seconds",
        "Wall time of one notification fan-out"
    );
    metrics::describe_counter!(
        "password_reset_requests_total",
        "Password reset requests by stage and outcome"
    );
    metrics::describe_counter!(
        "registration_resolutions_total",
        "Registration requests resolved by decision"
    );
    metrics::describe_counter!("login_attempts_total", "Login attempts by outcome");

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

/// 获取全局 Prometheus handle（用于自定义渲染）
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ============================================================================
// 指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录反馈创建
#[inline]
pub fn record_feedback_created(has_waiter_score: bool, ratings: usize) {
    metrics::counter!(
        "feedbacks_created_total",
        "waiter_score" => has_waiter_score.to_string()
    )
    .increment(1);
    metrics::histogram!("feedback_ratings_per_submission").record(ratings as f64);
}

/// 记录单个会话的投递结果（delivered / failed / timeout）
#[inline]
pub fn record_notification_delivery(outcome: &str) {
    metrics::counter!(
        "notification_deliveries_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录一次扇出的总耗时
#[inline]
pub fn record_notification_fanout(destinations: usize, duration_secs: f64) {
    metrics::histogram!(
        "notification_fanout_duration_seconds",
        "destinations" => destinations.to_string()
    )
    .record(duration_secs);
}

/// 记录密码重置（stage: initiate / complete）
#[inline]
pub fn record_password_reset(stage: &str, outcome: &str) {
    metrics::counter!(
        "password_reset_requests_total",
        "stage" => stage.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// 记录注册申请审批
#[inline]
pub fn record_registration_resolution(decision: &str) {
    metrics::counter!(
        "registration_resolutions_total",
        "decision" => decision.to_string()
    )
    .increment(1);
}

/// 记录登录结果
#[inline]
pub fn record_login(success: bool) {
    metrics::counter!(
        "login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 未安装 recorder 时记录为空操作
        record_http_request("GET", "/api/users", 200, 0.1);
        record_feedback_created(true, 3);
        record_notification_delivery("delivered");
        record_notification_fanout(3, 0.4);
        record_password_reset("initiate", "accepted");
        record_registration_resolution("approved");
        record_login(false);
    }
}
