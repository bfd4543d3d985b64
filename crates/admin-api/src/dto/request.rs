//! 请求 DTO 定义
//!
//! 所有 REST API 的请求参数和请求体结构

use chrono::NaiveDate;
use feedback_core::models::{CategoryKind, NewFeedback, NewRating, NewWaiterScore};
use feedback_core::service::{CreateUser, SubmitRegistration, UpdateUser};
use serde::Deserialize;
use validator::Validate;

// ==================== 认证 ====================

/// 登录请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "邮箱不能为空"))]
    pub email: String,
    #[validate(length(min = 1, message = "密码不能为空"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "重置令牌不能为空"))]
    pub token: String,
    pub new_password: String,
}

// ==================== 用户 ====================

/// 管理员创建用户请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "名字长度必须在1-100个字符之间"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "姓氏长度必须在1-100个字符之间"))]
    pub second_name: String,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    pub password: String,
    pub role_id: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl From<CreateUserRequest> for CreateUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            first_name: req.first_name,
            second_name: req.second_name,
            email: req.email,
            password: req.password,
            role_id: req.role_id,
            active: req.active,
        }
    }
}

/// 更新用户请求，缺省字段保持不变
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "名字长度必须在1-100个字符之间"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "姓氏长度必须在1-100个字符之间"))]
    pub second_name: Option<String>,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i64>,
    pub active: Option<bool>,
}

impl From<UpdateUserRequest> for UpdateUser {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            first_name: req.first_name,
            second_name: req.second_name,
            email: req.email,
            password: req.password,
            role_id: req.role_id,
            active: req.active,
        }
    }
}

/// 用户列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    pub limit: Option<i64>,
    pub cursor: Option<i64>,
    pub role_id: Option<i64>,
    pub active: Option<bool>,
    pub sort_by: Option<String>,
    pub ascending: Option<bool>,
}

// ==================== 注册申请 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRegistrationRequest {
    #[validate(length(min = 1, max = 100, message = "名字长度必须在1-100个字符之间"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "姓氏长度必须在1-100个字符之间"))]
    pub second_name: String,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    pub password: String,
    pub role_id: i64,
}

impl From<SubmitRegistrationRequest> for SubmitRegistration {
    fn from(req: SubmitRegistrationRequest) -> Self {
        Self {
            first_name: req.first_name,
            second_name: req.second_name,
            email: req.email,
            password: req.password,
            role_id: req.role_id,
        }
    }
}

/// 审批请求，status 接受 approve / approved / reject / rejected
#[derive(Debug, Deserialize)]
pub struct ResolveRegistrationRequest {
    pub status: String,
}

// ==================== 反馈 ====================

/// 客户提交反馈
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    #[validate(length(min = 1, max = 32, message = "联系电话长度必须在1-32个字符之间"))]
    pub contact: Option<String>,
    #[validate(nested)]
    pub waiter_score: Option<WaiterScoreRequest>,
    #[serde(default)]
    #[validate(nested)]
    pub ratings: Vec<RatingRequest>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WaiterScoreRequest {
    pub waiter_id: i64,
    #[validate(range(min = 1, max = 5, message = "评分必须在1-5之间"))]
    pub score: i32,
    #[validate(length(max = 2000, message = "评论不能超过2000字符"))]
    pub comment: Option<String>,
    pub tag_id: i64,
    pub category_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    #[validate(range(min = 1, max = 5, message = "评分必须在1-5之间"))]
    pub rating: i32,
    pub feedback_type_id: i64,
}

impl From<CreateFeedbackRequest> for NewFeedback {
    fn from(req: CreateFeedbackRequest) -> Self {
        Self {
            contact: req.contact,
            waiter_score: req.waiter_score.map(|s| NewWaiterScore {
                waiter_id: s.waiter_id,
                score: s.score,
                comment: s.comment,
                tag_id: s.tag_id,
                category_id: s.category_id,
            }),
            ratings: req
                .ratings
                .into_iter()
                .map(|r| NewRating {
                    rating: r.rating,
                    feedback_type_id: r.feedback_type_id,
                })
                .collect(),
        }
    }
}

/// 反馈列表查询参数（按 id 倒序）
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackListParams {
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

/// 评论列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListParams {
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
    pub waiter_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub ascending: Option<bool>,
}

// ==================== 分类体系 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "分类名称长度必须在1-50个字符之间"))]
    pub name: String,
    pub kind: Option<CategoryKind>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "分类名称长度必须在1-50个字符之间"))]
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 50, message = "标签名称长度必须在1-50个字符之间"))]
    pub name: String,
    pub category_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTagRequest {
    #[validate(length(min = 1, max = 50, message = "标签名称长度必须在1-50个字符之间"))]
    pub name: Option<String>,
    pub category_id: Option<i64>,
}

/// 标签列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagListParams {
    pub category_id: Option<i64>,
}

/// 反馈类型创建与更新共用
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackTypeRequest {
    #[validate(length(min = 1, max = 50, message = "反馈类型名称长度必须在1-50个字符之间"))]
    pub name: String,
}

// ==================== 推送目标 ====================

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddChatDestinationRequest {
    #[validate(length(min = 1, max = 64, message = "chatId 长度必须在1-64个字符之间"))]
    pub chat_id: String,
}
