//! 权限检查中间件
//!
//! 检查当前用户的角色能力是否允许指定操作

use std::future::Future;
use std::pin::Pin;

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use feedback_core::FeedbackError;
use feedback_core::models::Permission;
use tracing::debug;

use super::CurrentUser;
use crate::error::ApiError;

/// 权限检查中间件工厂
///
/// 必须位于 `auth_middleware` 之后。
///
/// # 示例
/// ```ignore
/// Router::new()
///     .route("/users", get(list_users))
///     .route_layer(from_fn(require_permission(Permission::ManageUsers)))
/// ```
pub fn require_permission(
    permission: Permission,
) -> impl Fn(Request<Body>, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone + Send
{
    move |request: Request<Body>, next: Next| {
        Box::pin(async move { check_permission(request, next, permission).await })
    }
}

async fn check_permission(request: Request<Body>, next: Next, permission: Permission) -> Response {
    let Some(current) = request.extensions().get::<CurrentUser>() else {
        return ApiError::from(FeedbackError::Unauthenticated).into_response();
    };

    if current.role.capability.allows(permission) {
        return next.run(request).await;
    }

    debug!(
        user_id = current.user.id,
        permission = ?permission,
        "权限不足"
    );
    ApiError::from(FeedbackError::Forbidden).into_response()
}
