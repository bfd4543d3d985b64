//! 反馈服务错误类型
//!
//! 仓储层与外部传输层的失败在服务边界统一转换为以下错误，由 HTTP 层映射为状态码。

use thiserror::Error;

/// 反馈服务错误类型
#[derive(Debug, Error)]
pub enum FeedbackError {
    // === 输入错误 ===
    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error("不支持的排序字段: {0}")]
    InvalidSortField(String),

    // === 资源错误 ===
    #[error("{entity} 不存在: id={id}")]
    NotFound { entity: &'static str, id: String },

    #[error("记录冲突: {0}")]
    Conflict(String),

    // === 认证错误 ===
    #[error("邮箱或密码错误")]
    InvalidCredentials,

    #[error("缺少认证 Token")]
    Unauthenticated,

    #[error("无效的 Token")]
    TokenInvalid,

    #[error("Token 已过期")]
    TokenExpired,

    #[error("用户不存在")]
    UserNotFound,

    #[error("权限不足")]
    Forbidden,

    // === 密码重置 ===
    #[error("重置链接无效")]
    ResetTokenInvalid,

    #[error("重置链接已过期")]
    ResetTokenExpired,

    // === 注册审批 ===
    #[error("注册申请状态不允许此操作: id={id}, current_status={status}")]
    InvalidStateTransition { id: i64, status: String },

    // === 系统错误 ===
    #[error("消息投递失败: {0}")]
    Delivery(String),

    #[error("服务暂不可用: {0}")]
    Unavailable(String),

    #[error("数据库错误: {0}")]
    Persistence(#[source] sqlx::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, FeedbackError>;

impl FeedbackError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// 游标所在行已被删除，无法定位下一页
    pub fn stale_cursor(cursor: i64) -> Self {
        Self::Validation(format!("分页游标 {cursor} 指向的记录已不存在，请从第一页重新查询"))
    }

    /// 获取错误码（API 契约的一部分）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidSortField(_) => "INVALID_SORT_FIELD",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::ResetTokenInvalid => "RESET_TOKEN_INVALID",
            Self::ResetTokenExpired => "RESET_TOKEN_EXPIRED",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::Delivery(_) => "DELIVERY_FAILURE",
            Self::Unavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为可重试错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Delivery(_))
    }
}

/// 唯一约束冲突 -> Conflict，外键约束 -> Validation，连接池超时 -> Unavailable
impl From<sqlx::Error> for FeedbackError {
    fn from(err: sqlx::Error) -> Self {
        let (code, constraint) = match &err {
            sqlx::Error::PoolTimedOut => {
                return Self::Unavailable("数据库连接池已耗尽".to_string());
            }
            sqlx::Error::PoolClosed => {
                return Self::Unavailable("数据库连接池已关闭".to_string());
            }
            sqlx::Error::Database(db_err) => (
                db_err.code().map(|c| c.into_owned()),
                db_err.constraint().map(str::to_string),
            ),
            _ => (None, None),
        };

        match code.as_deref() {
            Some("23505") => Self::Conflict(
                constraint
                    .map(|c| format!("违反唯一约束 {c}"))
                    .unwrap_or_else(|| "记录已存在".to_string()),
            ),
            Some("23503") => Self::Validation("引用的记录不存在或仍被其他记录引用".to_string()),
            Some("23514") => Self::Validation("字段取值超出允许范围".to_string()),
            _ => Self::Persistence(err),
        }
    }
}

/// 过期签名 -> TokenExpired，其余解码失败一律 TokenInvalid
impl From<jsonwebtoken::errors::Error> for FeedbackError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::TokenInvalid,
        }
    }
}
