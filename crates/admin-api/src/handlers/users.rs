//! 用户与角色管理 API 处理器

use axum::{
    Json,
    extract::{Path, Query, State},
};
use feedback_core::pagination::UserListQuery;
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, CreateUserRequest, CursorPageDto, DeletedResponse, RoleDto,
        UpdateUserRequest, UserDto, UserListParams,
    },
    error::Result,
    state::AppState,
};

/// 用户列表（游标分页）
///
/// GET /api/users?limit=&cursor=&roleId=&active=&sortBy=&ascending=
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> Result<Json<ApiResponse<CursorPageDto<UserDto>>>> {
    let query = UserListQuery::parse(
        params.limit,
        params.cursor,
        params.role_id,
        params.active,
        params.sort_by.as_deref(),
        params.ascending,
    )?;
    let page = state.users.list_users(&query).await?;
    Ok(Json(ApiResponse::success(page.into())))
}

/// 获取用户
///
/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserDto>>> {
    let user = state.users.get_user(id).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// 创建用户
///
/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>> {
    req.validate()?;
    let user = state.users.create_user(req.into()).await?;
    info!(user_id = user.id, "管理员创建用户");
    Ok(Json(ApiResponse::success(user.into())))
}

/// 更新用户
///
/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>> {
    req.validate()?;
    let user = state.users.update_user(id, req.into()).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// 删除用户
///
/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedResponse>>> {
    state.users.delete_user(id).await?;
    info!(user_id = id, "用户已删除");
    Ok(Json(ApiResponse::success(DeletedResponse::success())))
}

/// 角色列表
///
/// GET /api/roles
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<RoleDto>>>> {
    let roles = state.users.list_roles().await?;
    Ok(Json(ApiResponse::success(
        roles.into_iter().map(RoleDto::from).collect(),
    )))
}
