//! 分类、标签与反馈类型 API 处理器
//!
//! 读接口公开，写接口需要管理员权限。

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, CategoryDto, CreateCategoryRequest, CreateTagRequest, DeletedResponse,
        FeedbackTypeDto, FeedbackTypeRequest, TagDto, TagListParams, UpdateCategoryRequest,
        UpdateTagRequest,
    },
    error::Result,
    state::AppState,
};

// ==================== 分类 ====================

/// GET /api/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CategoryDto>>>> {
    let categories = state.taxonomy.list_categories().await?;
    Ok(Json(ApiResponse::success(
        categories.into_iter().map(CategoryDto::from).collect(),
    )))
}

/// GET /api/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryDto>>> {
    let category = state.taxonomy.get_category(id).await?;
    Ok(Json(ApiResponse::success(category.into())))
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryDto>>> {
    req.validate()?;
    let category = state.taxonomy.create_category(&req.name, req.kind).await?;
    Ok(Json(ApiResponse::success(category.into())))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryDto>>> {
    req.validate()?;
    let category = state
        .taxonomy
        .update_category(id, req.name.as_deref(), req.kind)
        .await?;
    Ok(Json(ApiResponse::success(category.into())))
}

/// 删除分类，其下标签一并删除
///
/// DELETE /api/categories/{id}
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    state.taxonomy.delete_category(id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}

/// GET /api/categories/{id}/tags
pub async fn category_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<TagDto>>>> {
    let tags = state.taxonomy.tags_by_category(id).await?;
    Ok(Json(ApiResponse::success(
        tags.into_iter().map(TagDto::from).collect(),
    )))
}

// ==================== 标签 ====================

/// GET /api/tags?categoryId=
pub async fn list_tags(
    State(state): State<AppState>,
    Query(params): Query<TagListParams>,
) -> Result<Json<ApiResponse<Vec<TagDto>>>> {
    let tags = match params.category_id {
        Some(category_id) => state.taxonomy.tags_by_category(category_id).await?,
        None => state.taxonomy.list_tags().await?,
    };
    Ok(Json(ApiResponse::success(
        tags.into_iter().map(TagDto::from).collect(),
    )))
}

/// GET /api/tags/{id}
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<TagDto>>> {
    let tag = state.taxonomy.get_tag(id).await?;
    Ok(Json(ApiResponse::success(tag.into())))
}

/// POST /api/tags
pub async fn create_tag(
    State(state): State<AppState>,
    Json(req): Json<CreateTagRequest>,
) -> Result<Json<ApiResponse<TagDto>>> {
    req.validate()?;
    let tag = state.taxonomy.create_tag(&req.name, req.category_id).await?;
    Ok(Json(ApiResponse::success(tag.into())))
}

/// PUT /api/tags/{id}
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTagRequest>,
) -> Result<Json<ApiResponse<TagDto>>> {
    req.validate()?;
    let tag = state
        .taxonomy
        .update_tag(id, req.name.as_deref(), req.category_id)
        .await?;
    Ok(Json(ApiResponse::success(tag.into())))
}

/// DELETE /api/tags/{id}
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    state.taxonomy.delete_tag(id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}

// ==================== 反馈类型 ====================

/// GET /api/feedback-types
pub async fn list_feedback_types(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<FeedbackTypeDto>>>> {
    let types = state.taxonomy.list_feedback_types().await?;
    Ok(Json(ApiResponse::success(
        types.into_iter().map(FeedbackTypeDto::from).collect(),
    )))
}

/// GET /api/feedback-types/{id}
pub async fn get_feedback_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<FeedbackTypeDto>>> {
    let feedback_type = state.taxonomy.get_feedback_type(id).await?;
    Ok(Json(ApiResponse::success(feedback_type.into())))
}

/// POST /api/feedback-types
pub async fn create_feedback_type(
    State(state): State<AppState>,
    Json(req): Json<FeedbackTypeRequest>,
) -> Result<Json<ApiResponse<FeedbackTypeDto>>> {
    req.validate()?;
    let feedback_type = state.taxonomy.create_feedback_type(&req.name).await?;
    Ok(Json(ApiResponse::success(feedback_type.into())))
}

/// PUT /api/feedback-types/{id}
pub async fn update_feedback_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<FeedbackTypeRequest>,
) -> Result<Json<ApiResponse<FeedbackTypeDto>>> {
    req.validate()?;
    let feedback_type = state.taxonomy.update_feedback_type(id, &req.name).await?;
    Ok(Json(ApiResponse::success(feedback_type.into())))
}

/// DELETE /api/feedback-types/{id}
pub async fn delete_feedback_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    state.taxonomy.delete_feedback_type(id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}
