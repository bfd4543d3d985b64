//! HTTP 请求处理器模块
//!
//! 处理器只做参数校验与 DTO 转换，业务逻辑在服务层

pub mod auth;
pub mod chat_destinations;
pub mod feedback;
pub mod health;
pub mod registration;
pub mod stats;
pub mod taxonomy;
pub mod users;
