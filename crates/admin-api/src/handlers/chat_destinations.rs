//! Telegram 推送目标管理 API 处理器

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{AddChatDestinationRequest, ApiResponse, ChatDestinationDto, DeletedResponse},
    error::Result,
    state::AppState,
};

/// GET /api/chat-destinations
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ChatDestinationDto>>>> {
    let destinations = state.destinations.list().await?;
    Ok(Json(ApiResponse::success(
        destinations.into_iter().map(ChatDestinationDto::from).collect(),
    )))
}

/// 添加推送目标，重复的 chatId 返回 409
///
/// POST /api/chat-destinations
pub async fn add(
    State(state): State<AppState>,
    Json(req): Json<AddChatDestinationRequest>,
) -> Result<Json<ApiResponse<ChatDestinationDto>>> {
    req.validate()?;
    let destination = state.destinations.add(&req.chat_id).await?;
    info!(id = %destination.id, chat_id = %destination.chat_id, "推送目标已添加");
    Ok(Json(ApiResponse::success(destination.into())))
}

/// DELETE /api/chat-destinations/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    state.destinations.remove(&id).await?;
    info!(id = %id, "推送目标已删除");
    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}
