//! 服务层
//!
//! 实现业务逻辑，协调仓储层与通知模块。
//!
//! ## 模块结构
//!
//! - `auth_service`: 登录、鉴权与密码重置
//! - `user_service`: 用户与角色管理
//! - `feedback_service`: 反馈提交、查询、评论分页
//! - `stats_service`: CSAT 与标签统计
//! - `registration_service`: 注册申请审批
//! - `taxonomy_service`: 分类、标签、反馈类型管理

pub mod auth_service;
pub mod feedback_service;
pub mod registration_service;
pub mod stats_service;
pub mod taxonomy_service;
pub mod user_service;

pub use auth_service::{AuthService, PASSWORD_UPDATED_MESSAGE, RESET_REQUESTED_MESSAGE};
pub use feedback_service::FeedbackService;
pub use registration_service::{RegistrationService, SubmitRegistration};
pub use stats_service::{CsatReport, StatsService, TagStats, compute_csat};
pub use taxonomy_service::TaxonomyService;
pub use user_service::{CreateUser, UpdateUser, UserService};
