//! 中间件模块
//!
//! 提供 Bearer Token 认证与权限检查中间件

mod auth;
mod permission;

pub use auth::{CurrentUser, auth_middleware};
pub use permission::require_permission;
