//! 可观测性模块集成测试
//!
//! 测试 metrics、middleware 与配置的核心行为。
//! 未安装 recorder 时指标调用是空操作，这里只验证各记录函数在任意输入下不会 panic。

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use hrm_shared::observability::metrics::{
        get_handle, record_feedback_created, record_http_request, record_login,
        record_notification_delivery, record_notification_fanout, record_password_reset,
        record_registration_resolution,
    };

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/users", 200, 0.05);
        record_http_request("POST", "/api/feedbacks", 200, 0.12);
        record_http_request("DELETE", "/api/feedbacks/{id}", 404, 0.01);
        record_http_request("GET", "/api/stats/{waiter_id}", 500, 0.25);
    }

    #[test]
    fn test_record_feedback_and_fanout() {
        record_feedback_created(true, 3);
        record_feedback_created(false, 0);
        record_notification_fanout(0, 0.0);
        record_notification_fanout(5, 1.2);

        for outcome in ["delivered", "failed", "timed_out"] {
            record_notification_delivery(outcome);
        }
    }

    #[test]
    fn test_record_account_events() {
        record_login(true);
        record_login(false);
        record_password_reset("initiate", "sent");
        record_password_reset("complete", "expired");
        record_registration_resolution("approve");
        record_registration_resolution("reject");
    }

    #[test]
    fn test_handle_absent_without_init() {
        // 测试进程中从未调用 metrics::init
        assert!(get_handle().is_none());
    }
}

// ============================================================================
// 中间件测试
// ============================================================================

mod middleware_tests {
    use axum::{Extension, Router, body::Body, http::Request, middleware, routing::get};
    use http_body_util::BodyExt;
    use hrm_shared::observability::middleware::{
        REQUEST_ID_HEADER, RequestId, http_tracing, request_id,
    };
    use tower::ServiceExt;

    #[test]
    fn test_request_id_as_str() {
        let id = RequestId("req-7".to_string());
        assert_eq!(id.as_str(), "req-7");
        assert_eq!(id.clone().0, "req-7");
    }

    #[tokio::test]
    async fn test_handler_sees_same_request_id_as_response() {
        let app = Router::new()
            .route(
                "/echo",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .layer(middleware::from_fn(http_tracing))
            .layer(middleware::from_fn(request_id));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header(REQUEST_ID_HEADER, "trace-abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), "trace-abc");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"trace-abc");
    }
}

// ============================================================================
// 配置测试
// ============================================================================

mod config_tests {
    use hrm_shared::observability::{ObservabilityConfig, ObservabilityGuard};

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert!(config.metrics_enabled);
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.service_name, "unknown-service");
    }

    #[test]
    fn test_custom_config() {
        let config = ObservabilityConfig {
            metrics_enabled: false,
            json_logs: true,
            log_level: "debug".to_string(),
            ..Default::default()
        }
        .with_service_name("hrm-admin");

        assert_eq!(config.service_name, "hrm-admin");
        assert!(!config.metrics_enabled);
        assert!(config.json_logs);
    }

    #[test]
    fn test_empty_guard() {
        let _guard = ObservabilityGuard::empty();
    }
}
