//! 存活与就绪探针

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use crate::state::AppState;

const SERVICE_NAME: &str = "hrm-admin";

/// 存活探针：服务进程正常即返回 ok
///
/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME
    }))
}

/// 就绪探针：检查数据库连接是否可用
///
/// GET /ready
///
/// 数据库不可用时返回 503，负载均衡据此摘除实例。
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let db_ok = match &state.database {
        Some(db) => db.health_check().await.is_ok(),
        // 未接数据库（内存仓储）视为就绪
        None => true,
    };

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if db_ok { "ok" } else { "degraded" },
            "service": SERVICE_NAME,
            "checks": {
                "database": if db_ok { "ok" } else { "fail" }
            }
        })),
    )
}
