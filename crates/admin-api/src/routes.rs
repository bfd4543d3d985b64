//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射。每组路由在合并前挂上各自的认证与权限检查，
//! 同一路径的不同方法可以分属不同的组。

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use feedback_core::models::Permission;

use crate::{
    handlers,
    middleware::{auth_middleware, require_permission},
    state::AppState,
};

/// 为路由组挂上认证中间件，以及可选的权限检查
///
/// route_layer 后加的在外层，认证先于权限检查执行。
fn guarded(router: Router<AppState>, state: &AppState, permission: Option<Permission>) -> Router<AppState> {
    let router = match permission {
        Some(permission) => router.route_layer(middleware::from_fn(require_permission(permission))),
        None => router,
    };
    router.route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// 无需认证的路由
fn public_routes() -> Router<AppState> {
    Router::new()
        // 认证
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        // 注册与反馈提交
        .route("/registration-requests", post(handlers::registration::submit))
        .route("/feedbacks", post(handlers::feedback::create_feedback))
        // 分类体系只读
        .route("/categories", get(handlers::taxonomy::list_categories))
        .route("/categories/{id}", get(handlers::taxonomy::get_category))
        .route("/categories/{id}/tags", get(handlers::taxonomy::category_tags))
        .route("/tags", get(handlers::taxonomy::list_tags))
        .route("/tags/{id}", get(handlers::taxonomy::get_tag))
        .route("/feedback-types", get(handlers::taxonomy::list_feedback_types))
        .route("/feedback-types/{id}", get(handlers::taxonomy::get_feedback_type))
}

/// 任意已登录用户可访问的路由
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/users/{id}", get(handlers::users::get_user))
        .route("/roles", get(handlers::users::list_roles))
}

fn user_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/admin", get(handlers::auth::admin))
        .route("/users", get(handlers::users::list_users))
        .route("/users", post(handlers::users::create_user))
        .route("/users/{id}", put(handlers::users::update_user))
        .route("/users/{id}", delete(handlers::users::delete_user))
}

fn registration_routes() -> Router<AppState> {
    Router::new()
        .route("/registration-requests", get(handlers::registration::list))
        .route(
            "/registration-requests/{id}/status",
            post(handlers::registration::resolve),
        )
        .route(
            "/registration-requests/{id}",
            get(handlers::registration::get).delete(handlers::registration::delete),
        )
}

fn feedback_read_routes() -> Router<AppState> {
    Router::new()
        .route("/feedbacks", get(handlers::feedback::list_feedbacks))
        .route("/feedbacks/{id}", get(handlers::feedback::get_feedback))
        .route("/comments", get(handlers::feedback::list_comments))
}

fn feedback_admin_routes() -> Router<AppState> {
    Router::new().route("/feedbacks/{id}", delete(handlers::feedback::delete_feedback))
}

fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/stats/{waiter_id}", get(handlers::stats::csat))
        .route("/stats/{waiter_id}/tags", get(handlers::stats::tag_stats))
}

/// 分类体系写操作
fn taxonomy_admin_routes() -> Router<AppState> {
    Router::new()
        // 分类
        .route("/categories", post(handlers::taxonomy::create_category))
        .route("/categories/{id}", put(handlers::taxonomy::update_category))
        .route("/categories/{id}", delete(handlers::taxonomy::delete_category))
        // 标签
        .route("/tags", post(handlers::taxonomy::create_tag))
        .route("/tags/{id}", put(handlers::taxonomy::update_tag))
        .route("/tags/{id}", delete(handlers::taxonomy::delete_tag))
        // 反馈类型
        .route("/feedback-types", post(handlers::taxonomy::create_feedback_type))
        .route("/feedback-types/{id}", put(handlers::taxonomy::update_feedback_type))
        .route("/feedback-types/{id}", delete(handlers::taxonomy::delete_feedback_type))
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/chat-destinations", get(handlers::chat_destinations::list))
        .route("/chat-destinations", post(handlers::chat_destinations::add))
        .route(
            "/chat-destinations/{id}",
            delete(handlers::chat_destinations::remove),
        )
}

/// 构建完整的 API 路由（挂载在 /api 下）
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(guarded(user_routes(), state, None))
        .merge(guarded(user_admin_routes(), state, Some(Permission::ManageUsers)))
        .merge(guarded(
            registration_routes(),
            state,
            Some(Permission::ReviewRegistrations),
        ))
        .merge(guarded(feedback_read_routes(), state, Some(Permission::ViewFeedback)))
        .merge(guarded(
            feedback_admin_routes(),
            state,
            Some(Permission::DeleteFeedback),
        ))
        .merge(guarded(stats_routes(), state, Some(Permission::ViewStats)))
        .merge(guarded(
            taxonomy_admin_routes(),
            state,
            Some(Permission::ManageTaxonomy),
        ))
        .merge(guarded(
            notification_routes(),
            state,
            Some(Permission::ManageNotifications),
        ))
}

/// 构建应用路由：/api 业务接口与探针
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(&state))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_construction() {
        let _public = public_routes();
        let _user = user_routes();
        let _user_admin = user_admin_routes();
        let _registration = registration_routes();
        let _feedback_read = feedback_read_routes();
        let _feedback_admin = feedback_admin_routes();
        let _stats = stats_routes();
        let _taxonomy = taxonomy_admin_routes();
        let _notification = notification_routes();
    }
}
