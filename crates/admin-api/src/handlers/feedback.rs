//! 反馈 API 处理器
//!
//! 提交反馈后立即返回，Telegram 推送在后台进行。

use axum::{
    Json,
    extract::{Path, Query, State},
};
use feedback_core::pagination::{CommentQuery, clamp_limit};
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, CommentDto, CommentListParams, CreateFeedbackRequest, CursorPageDto,
        DeletedResponse, FeedbackDto, FeedbackListParams,
    },
    error::Result,
    state::AppState,
};

/// 提交反馈（公开）
///
/// POST /api/feedbacks
pub async fn create_feedback(
    State(state): State<AppState>,
    Json(req): Json<CreateFeedbackRequest>,
) -> Result<Json<ApiResponse<FeedbackDto>>> {
    req.validate()?;
    let feedback = state.feedbacks.create_feedback(req.into()).await?;
    Ok(Json(ApiResponse::success(feedback.into())))
}

/// 反馈列表（按 id 倒序）
///
/// GET /api/feedbacks?cursor=&limit=
pub async fn list_feedbacks(
    State(state): State<AppState>,
    Query(params): Query<FeedbackListParams>,
) -> Result<Json<ApiResponse<CursorPageDto<FeedbackDto>>>> {
    let page = state
        .feedbacks
        .list_feedbacks(params.cursor, params.limit)
        .await?;
    Ok(Json(ApiResponse::success(page.into())))
}

/// GET /api/feedbacks/{id}
pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FeedbackDto>>> {
    let feedback = state.feedbacks.get_feedback(id).await?;
    Ok(Json(ApiResponse::success(feedback.into())))
}

/// DELETE /api/feedbacks/{id}
pub async fn delete_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    state.feedbacks.delete_feedback(id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}

/// 评论列表
///
/// GET /api/comments?waiterId=&startDate=&endDate=&cursor=&limit=&ascending=
pub async fn list_comments(
    State(state): State<AppState>,
    Query(params): Query<CommentListParams>,
) -> Result<Json<ApiResponse<CursorPageDto<CommentDto>>>> {
    let query = CommentQuery {
        cursor: params.cursor,
        limit: clamp_limit(params.limit),
        waiter_id: params.waiter_id,
        start: params.start_date,
        end: params.end_date,
        ascending: params.ascending.unwrap_or(false),
    };
    let page = state.feedbacks.list_comments(&query).await?;
    Ok(Json(ApiResponse::success(page.into())))
}
