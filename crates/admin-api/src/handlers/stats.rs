//! 员工评价统计 API 处理器

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    dto::{ApiResponse, CsatDto, TagStatsDto},
    error::Result,
    state::AppState,
};

/// 员工 CSAT
///
/// GET /api/stats/{waiter_id}
pub async fn csat(
    State(state): State<AppState>,
    Path(waiter_id): Path<i64>,
) -> Result<Json<ApiResponse<CsatDto>>> {
    let report = state.stats.csat(waiter_id).await?;
    Ok(Json(ApiResponse::success(report.into())))
}

/// 员工按分类的标签次数
///
/// GET /api/stats/{waiter_id}/tags
pub async fn tag_stats(
    State(state): State<AppState>,
    Path(waiter_id): Path<i64>,
) -> Result<Json<ApiResponse<TagStatsDto>>> {
    let stats = state.stats.tag_stats(waiter_id).await?;
    Ok(Json(ApiResponse::success(TagStatsDto::new(waiter_id, stats))))
}
