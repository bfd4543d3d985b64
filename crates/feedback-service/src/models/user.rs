//! 用户、角色、注册申请与密码重置模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::enums::{RegistrationStatus, RoleCapability};

/// 系统用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub role_id: i64,
    pub active: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.second_name)
    }
}

/// 新建用户（密码已哈希）
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    pub hashed_password: String,
    pub role_id: i64,
    pub active: bool,
}

/// 用户部分更新
///
/// 只有 `Some` 的字段会被写入。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub second_name: Option<String>,
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub role_id: Option<i64>,
    pub active: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.second_name.is_none()
            && self.email.is_none()
            && self.hashed_password.is_none()
            && self.role_id.is_none()
            && self.active.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(second_name) = &self.second_name {
            user.second_name = second_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(hashed_password) = &self.hashed_password {
            user.hashed_password = hashed_password.clone();
        }
        if let Some(role_id) = self.role_id {
            user.role_id = role_id;
        }
        if let Some(active) = self.active {
            user.active = active;
        }
    }
}

/// 角色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub capability: RoleCapability,
}

/// 注册申请
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RegistrationRequest {
    pub id: i64,
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub role_id: i64,
    pub status: RegistrationStatus,
    pub admin_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl RegistrationRequest {
    /// 审批通过后生成的用户
    pub fn to_new_user(&self, active: bool) -> NewUser {
        NewUser {
            first_name: self.first_name.clone(),
            second_name: self.second_name.clone(),
            email: self.email.clone(),
            hashed_password: self.hashed_password.clone(),
            role_id: self.role_id,
            active,
        }
    }
}

/// 新建注册申请（密码已哈希）
#[derive(Debug, Clone)]
pub struct NewRegistrationRequest {
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    pub hashed_password: String,
    pub role_id: i64,
}

/// 审批结果：approved 时携带新建用户
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationOutcome {
    pub request: RegistrationRequest,
    pub user: Option<User>,
}

/// 密码重置令牌
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PasswordReset {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// 消费重置令牌的结果
///
/// 无论过期与否令牌都已被删除。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetConsumption {
    Consumed { user_id: i64 },
    Expired,
    Unknown,
}
