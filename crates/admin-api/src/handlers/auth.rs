//! 认证 API 处理器
//!
//! 登录、当前用户查询与密码重置

use axum::{Extension, Json, extract::State};
use validator::Validate;

use crate::{
    dto::{ApiResponse, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, TokenDto, UserDto},
    error::Result,
    middleware::CurrentUser,
    state::AppState,
};

/// 登录
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenDto>>> {
    req.validate()?;
    let token = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(ApiResponse::success(token.into())))
}

/// 当前登录用户
///
/// GET /api/auth/me
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(current.user.into()))
}

/// 当前用户且必须是管理员
///
/// GET /api/auth/admin
pub async fn admin(Extension(current): Extension<CurrentUser>) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(current.user.into()))
}

/// 发起密码重置
///
/// POST /api/auth/forgot-password
///
/// 邮箱是否注册都返回同一条消息。
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>> {
    req.validate()?;
    let message = state.auth.initiate_password_reset(&req.email).await?;
    Ok(Json(ApiResponse::message_only(message)))
}

/// 使用重置令牌设置新密码
///
/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>> {
    req.validate()?;
    let message = state
        .auth
        .complete_password_reset(&req.token, &req.new_password)
        .await?;
    Ok(Json(ApiResponse::message_only(message)))
}
