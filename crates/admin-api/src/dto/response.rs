//! 响应 DTO 定义
//!
//! 所有 REST API 的响应体结构

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use feedback_core::models::{
    Category, CategoryKind, Contact, Feedback, FeedbackComment, FeedbackType, Rating,
    RegistrationOutcome, RegistrationRequest, RegistrationStatus, Role, RoleCapability, Tag, User,
    WaiterScore,
};
use feedback_core::notification::ChatDestination;
use feedback_core::pagination::CursorPage;
use feedback_core::service::{CsatReport, TagStats};
use feedback_core::AccessToken;
use serde::Serialize;

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// 只带提示消息的成功响应
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

/// 游标分页响应
///
/// `nextCursor` 为空表示已是最后一页。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPageDto<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<i64>,
}

impl<T, U: From<T>> From<CursorPage<T>> for CursorPageDto<U> {
    fn from(page: CursorPage<T>) -> Self {
        let page = page.map(U::from);
        Self {
            items: page.items,
            next_cursor: page.next_cursor,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub deleted: bool,
}

impl DeletedResponse {
    pub fn success() -> Self {
        Self { deleted: true }
    }
}

// ==================== 认证与用户 ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl From<AccessToken> for TokenDto {
    fn from(token: AccessToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type.to_string(),
            expires_at: token.expires_at,
        }
    }
}

/// 用户响应，不含密码哈希
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    pub role_id: i64,
    pub active: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            second_name: user.second_name,
            email: user.email,
            role_id: user.role_id,
            active: user.active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDto {
    pub id: i64,
    pub name: String,
    pub capability: RoleCapability,
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            capability: role.capability,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequestDto {
    pub id: i64,
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    pub role_id: i64,
    pub status: RegistrationStatus,
    pub admin_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<RegistrationRequest> for RegistrationRequestDto {
    fn from(r: RegistrationRequest) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name,
            second_name: r.second_name,
            email: r.email,
            role_id: r.role_id,
            status: r.status,
            admin_id: r.admin_id,
            created_at: r.created_at,
        }
    }
}

/// 审批结果，通过时附带新建用户
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcomeDto {
    pub request: RegistrationRequestDto,
    pub user: Option<UserDto>,
}

impl From<RegistrationOutcome> for RegistrationOutcomeDto {
    fn from(outcome: RegistrationOutcome) -> Self {
        Self {
            request: outcome.request.into(),
            user: outcome.user.map(UserDto::from),
        }
    }
}

// ==================== 反馈 ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    pub id: i64,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaiterScoreDto {
    pub id: i64,
    pub waiter_id: i64,
    pub score: i32,
    pub comment: Option<String>,
    pub tag_id: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingDto {
    pub id: i64,
    pub rating: i32,
    pub feedback_type_id: i64,
}

/// 反馈详情（含子实体）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDto {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub is_notified: bool,
    pub contact: Option<ContactDto>,
    pub waiter_score: Option<WaiterScoreDto>,
    pub ratings: Vec<RatingDto>,
}

impl From<Contact> for ContactDto {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            phone: c.phone,
        }
    }
}

impl From<WaiterScore> for WaiterScoreDto {
    fn from(s: WaiterScore) -> Self {
        Self {
            id: s.id,
            waiter_id: s.waiter_id,
            score: s.score,
            comment: s.comment,
            tag_id: s.tag_id,
            category_id: s.category_id,
        }
    }
}

impl From<Rating> for RatingDto {
    fn from(r: Rating) -> Self {
        Self {
            id: r.id,
            rating: r.rating,
            feedback_type_id: r.feedback_type_id,
        }
    }
}

impl From<Feedback> for FeedbackDto {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            created_at: f.created_at,
            is_notified: f.is_notified,
            contact: f.contact.map(ContactDto::from),
            waiter_score: f.waiter_score.map(WaiterScoreDto::from),
            ratings: f.ratings.into_iter().map(RatingDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub feedback_id: i64,
    pub waiter_id: i64,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FeedbackComment> for CommentDto {
    fn from(c: FeedbackComment) -> Self {
        Self {
            feedback_id: c.feedback_id,
            waiter_id: c.waiter_id,
            score: c.score,
            comment: c.comment,
            created_at: c.created_at,
        }
    }
}

// ==================== 分类体系 ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
    pub kind: Option<CategoryKind>,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            kind: c.kind,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDto {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
}

impl From<Tag> for TagDto {
    fn from(t: Tag) -> Self {
        Self {
            id: t.id,
            name: t.name,
            category_id: t.category_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackTypeDto {
    pub id: i64,
    pub name: String,
}

impl From<FeedbackType> for FeedbackTypeDto {
    fn from(t: FeedbackType) -> Self {
        Self {
            id: t.id,
            name: t.name,
        }
    }
}

// ==================== 统计 ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsatDto {
    pub waiter_id: i64,
    pub csat: f64,
    pub total_feedbacks: i64,
    pub positive_feedbacks: i64,
}

impl From<CsatReport> for CsatDto {
    fn from(r: CsatReport) -> Self {
        Self {
            waiter_id: r.waiter_id,
            csat: r.csat,
            total_feedbacks: r.total_feedbacks,
            positive_feedbacks: r.positive_feedbacks,
        }
    }
}

/// 分类名 -> 标签名 -> 次数
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStatsDto {
    pub waiter_id: i64,
    pub categories: BTreeMap<String, BTreeMap<String, i64>>,
}

impl TagStatsDto {
    pub fn new(waiter_id: i64, categories: TagStats) -> Self {
        Self {
            waiter_id,
            categories,
        }
    }
}

// ==================== 推送目标 ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDestinationDto {
    pub id: String,
    pub chat_id: String,
}

impl From<ChatDestination> for ChatDestinationDto {
    fn from(d: ChatDestination) -> Self {
        Self {
            id: d.id,
            chat_id: d.chat_id,
        }
    }
}
