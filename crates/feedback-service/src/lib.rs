//! 餐厅员工与顾客反馈核心库
//!
//! 提供员工账户、顾客反馈、评价统计以及 Telegram 通知推送的领域逻辑。
//!
//! ## 核心功能
//!
//! - **账户认证**：JWT 登录、基于角色的权限校验、邮件密码重置
//! - **注册审批**：员工自助提交注册申请，管理员通过或拒绝
//! - **反馈采集**：联系方式、员工评分与多维度评分在单个事务内写入
//! - **游标分页**：用户列表与评论列表的键集分页
//! - **评价统计**：员工 CSAT 与按分类的标签统计
//! - **通知推送**：反馈创建后异步并发推送到全部 Telegram 会话
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `auth`: JWT、密码哈希、重置令牌
//! - `pagination`: 分页查询参数与游标页
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层
//! - `notification`: 推送目标、消息格式化、投递与邮件
//! - `testing`: 仓储与传输的内存实现

pub mod auth;
pub mod error;
pub mod models;
pub mod notification;
pub mod pagination;
pub mod repository;
pub mod service;
pub mod testing;

pub use auth::{AccessToken, Claims, JwtConfig, JwtManager};
pub use error::{FeedbackError, Result};
pub use models::*;
pub use notification::{
    ChatDestination, ChatDestinationStore, DispatchReport, FeedbackNotifier,
    JsonFileDestinationStore, NotificationDispatcher, TelegramTransport,
};
pub use pagination::{CommentQuery, CursorPage, UserListQuery, UserSortField};
pub use repository::{
    FeedbackRepository, PasswordResetRepository, RegistrationRepository, RoleRepository,
    TaxonomyRepository, UserRepository,
};
pub use service::{
    AuthService, FeedbackService, RegistrationService, StatsService, TaxonomyService, UserService,
};
