//! 餐厅员工与反馈管理后台服务
//!
//! 提供登录鉴权、用户与注册审批、反馈采集、评价统计和推送目标管理的 REST API。
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误到 HTTP 响应的映射
//! - `handlers`: HTTP 请求处理器
//! - `middleware`: Bearer Token 鉴权与权限检查
//! - `routes`: 路由配置
//! - `state`: 应用状态
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use dto::ApiResponse;
pub use error::{ApiError, Result};
pub use state::{AppState, Repositories};
