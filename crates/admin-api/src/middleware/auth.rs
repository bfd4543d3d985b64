//! Bearer Token 认证中间件
//!
//! 验证 Token 并将当前用户与其角色注入请求扩展

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use feedback_core::models::{Role, User};

use crate::error::ApiError;
use crate::state::AppState;

/// 已认证的当前用户
///
/// 角色每次请求都从存储中重新读取，Token 签发后的角色变更立即生效。
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub role: Role,
}

/// 认证中间件
///
/// Token 缺失、格式错误、过期或用户已删除时返回 401。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .map(|header| header.token().to_string());

    let current = async {
        let user = state.auth.resolve_user(token.as_deref()).await?;
        let role = state.auth.role_of(&user).await?;
        Ok::<_, ApiError>(CurrentUser { user, role })
    };

    match current.await {
        Ok(current) => {
            request.extensions_mut().insert(current);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
