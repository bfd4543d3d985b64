//! 用户与角色管理服务

use std::sync::Arc;

use tracing::{info, instrument};

use crate::auth::{hash_password, validate_new_password};
use crate::error::{FeedbackError, Result};
use crate::models::{NewUser, Role, User, UserPatch};
use crate::pagination::{CursorPage, UserListQuery};
use crate::repository::{RoleRepositoryTrait, UserRepositoryTrait};

/// 管理员直接创建用户的输入
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    pub password: String,
    pub role_id: i64,
    pub active: bool,
}

/// 用户更新输入，password 为明文，保存前重新哈希
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub second_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i64>,
    pub active: Option<bool>,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn required_name(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FeedbackError::Validation(format!("{field} 不能为空")));
    }
    Ok(value.to_string())
}

pub struct UserService {
    users: Arc<dyn UserRepositoryTrait>,
    roles: Arc<dyn RoleRepositoryTrait>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepositoryTrait>, roles: Arc<dyn RoleRepositoryTrait>) -> Self {
        Self { users, roles }
    }

    async fn ensure_role(&self, role_id: i64) -> Result<Role> {
        self.roles
            .get_role(role_id)
            .await?
            .ok_or_else(|| FeedbackError::Validation(format!("角色不存在: {role_id}")))
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: CreateUser) -> Result<User> {
        validate_new_password(&input.password)?;
        self.ensure_role(input.role_id).await?;

        let email = normalize_email(&input.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(FeedbackError::Conflict(format!("邮箱已被使用: {email}")));
        }

        let user = self
            .users
            .create_user(&NewUser {
                first_name: required_name("first_name", &input.first_name)?,
                second_name: required_name("second_name", &input.second_name)?,
                email,
                hashed_password: hash_password(&input.password)?,
                role_id: input.role_id,
                active: input.active,
            })
            .await?;

        info!(user_id = user.id, "用户已创建");
        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| FeedbackError::not_found("user", id))
    }

    /// 部分更新；空更新直接返回当前用户
    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: i64, input: UpdateUser) -> Result<User> {
        let mut patch = UserPatch {
            first_name: input
                .first_name
                .as_deref()
                .map(|v| required_name("first_name", v))
                .transpose()?,
            second_name: input
                .second_name
                .as_deref()
                .map(|v| required_name("second_name", v))
                .transpose()?,
            email: input.email.as_deref().map(normalize_email),
            hashed_password: None,
            role_id: input.role_id,
            active: input.active,
        };

        if let Some(password) = &input.password {
            validate_new_password(password)?;
            patch.hashed_password = Some(hash_password(password)?);
        }
        if let Some(role_id) = patch.role_id {
            self.ensure_role(role_id).await?;
        }

        if patch.is_empty() {
            return self.get_user(id).await;
        }

        let user = self
            .users
            .update_user(id, &patch)
            .await?
            .ok_or_else(|| FeedbackError::not_found("user", id))?;

        info!(user_id = id, "用户已更新");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        if !self.users.delete_user(id).await? {
            return Err(FeedbackError::not_found("user", id));
        }
        info!(user_id = id, "用户已删除");
        Ok(())
    }

    pub async fn list_users(&self, query: &UserListQuery) -> Result<CursorPage<User>> {
        let users = self.users.list_users(query).await?;
        Ok(CursorPage::from_rows(users, query.limit, |u| u.id))
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>> {
        self.roles.list_roles().await
    }
}
