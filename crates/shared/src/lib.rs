//! 共享库
//!
//! 包含各服务共用的配置加载、数据库连接池以及可观测性（日志、指标、HTTP 中间件）基础设施。

pub mod config;
pub mod database;
pub mod error;
pub mod observability;
