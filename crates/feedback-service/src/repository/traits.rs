//! 仓储 Trait 定义
//!
//! 服务层依赖抽象而非具体实现，便于 mock 测试与内存实现替换。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    Category, CategoryKind, CategoryPatch, Feedback, FeedbackComment, FeedbackDraft,
    FeedbackType, NewCategory, NewRegistrationRequest, NewTag, NewUser, PasswordReset,
    RegistrationDecision, RegistrationOutcome, RegistrationRequest, ResetConsumption, Role,
    ScoreFilter, Tag, TagPatch, User, UserPatch,
};
use crate::pagination::{CommentQuery, UserListQuery};

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// 返回至多 `query.limit` 行，游标语义见 `pagination` 模块
    async fn list_users(&self, query: &UserListQuery) -> Result<Vec<User>>;
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    /// 用户不存在时返回 None
    async fn update_user(&self, id: i64, patch: &UserPatch) -> Result<Option<User>>;
    /// 返回是否删除了记录
    async fn delete_user(&self, id: i64) -> Result<bool>;
}

/// 角色仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepositoryTrait: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<Role>>;
    async fn get_role(&self, id: i64) -> Result<Option<Role>>;
}

/// 密码重置令牌仓储接口
///
/// 两个写操作都必须在单个事务内完成。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordResetRepositoryTrait: Send + Sync {
    /// 删除该用户已有的令牌并写入新令牌
    async fn replace_for_user(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset>;

    /// 删除令牌；未过期时同时更新用户密码
    async fn consume(
        &self,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> Result<ResetConsumption>;

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>>;
}

/// 注册申请仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationRepositoryTrait: Send + Sync {
    async fn create_request(&self, request: &NewRegistrationRequest) -> Result<RegistrationRequest>;
    async fn get_request(&self, id: i64) -> Result<Option<RegistrationRequest>>;
    async fn list_requests(&self) -> Result<Vec<RegistrationRequest>>;
    async fn delete_request(&self, id: i64) -> Result<bool>;

    /// 在单个事务内锁定申请、校验 pending、更新状态，并在通过时创建用户
    async fn resolve(
        &self,
        id: i64,
        decision: RegistrationDecision,
        admin_id: i64,
        activate_user: bool,
    ) -> Result<RegistrationOutcome>;
}

/// 反馈聚合仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackRepositoryTrait: Send + Sync {
    /// 单事务写入聚合根与全部子实体
    async fn create_feedback(&self, draft: &FeedbackDraft) -> Result<Feedback>;
    async fn get_feedback(&self, id: i64) -> Result<Option<Feedback>>;
    /// 按 id 倒序，游标为上一页最后一个 id
    async fn list_feedbacks(&self, cursor: Option<i64>, limit: i64) -> Result<Vec<Feedback>>;
    /// 返回是否删除了记录
    async fn delete_feedback(&self, id: i64) -> Result<bool>;
    async fn list_comments(&self, query: &CommentQuery) -> Result<Vec<FeedbackComment>>;
    async fn mark_notified(&self, id: i64) -> Result<()>;
}

/// 员工评分统计接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WaiterScoreRepositoryTrait: Send + Sync {
    async fn count_scores(&self, waiter_id: i64, filter: ScoreFilter) -> Result<i64>;
}

/// 分类体系仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaxonomyRepositoryTrait: Send + Sync {
    // 分类
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn get_category(&self, id: i64) -> Result<Option<Category>>;
    async fn find_category_by_kind(&self, kind: CategoryKind) -> Result<Option<Category>>;
    async fn create_category(&self, category: &NewCategory) -> Result<Category>;
    async fn update_category(&self, id: i64, patch: &CategoryPatch) -> Result<Option<Category>>;
    async fn delete_category(&self, id: i64) -> Result<bool>;

    // 标签
    async fn list_tags(&self, category_id: Option<i64>) -> Result<Vec<Tag>>;
    async fn get_tag(&self, id: i64) -> Result<Option<Tag>>;
    async fn create_tag(&self, tag: &NewTag) -> Result<Tag>;
    async fn update_tag(&self, id: i64, patch: &TagPatch) -> Result<Option<Tag>>;
    async fn delete_tag(&self, id: i64) -> Result<bool>;

    // 反馈类型
    async fn list_feedback_types(&self) -> Result<Vec<FeedbackType>>;
    async fn get_feedback_type(&self, id: i64) -> Result<Option<FeedbackType>>;
    async fn create_feedback_type(&self, name: &str) -> Result<FeedbackType>;
    async fn update_feedback_type(&self, id: i64, name: &str) -> Result<Option<FeedbackType>>;
    async fn delete_feedback_type(&self, id: i64) -> Result<bool>;
}
