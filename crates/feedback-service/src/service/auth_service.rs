//! 认证服务
//!
//! 登录签发 JWT、按 Token 解析用户、管理员鉴权，以及密码重置流程。

use std::sync::Arc;

use chrono::{Duration, Utc};
use hrm_shared::config::AuthConfig;
use hrm_shared::observability::metrics;
use tracing::{debug, info, instrument, warn};

use crate::auth::{
    AccessToken, JwtConfig, JwtManager, generate_reset_token, hash_password,
    validate_new_password, verify_password,
};
use crate::error::{FeedbackError, Result};
use crate::models::{Permission, ResetConsumption, Role, User};
use crate::notification::{EmailTransport, password_reset_email};
use crate::repository::{PasswordResetRepositoryTrait, RoleRepositoryTrait, UserRepositoryTrait};
use crate::service::user_service::normalize_email;

/// 找回密码的统一响应，不暴露邮箱是否注册
pub const RESET_REQUESTED_MESSAGE: &str =
    "Если email зарегистрирован, инструкции по сбросу пароля отправлены";
pub const PASSWORD_UPDATED_MESSAGE: &str = "Ваш пароль успешно обновлен";

pub struct AuthService {
    users: Arc<dyn UserRepositoryTrait>,
    roles: Arc<dyn RoleRepositoryTrait>,
    resets: Arc<dyn PasswordResetRepositoryTrait>,
    mailer: Arc<dyn EmailTransport>,
    jwt: JwtManager,
    reset_ttl: Duration,
    app_url: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepositoryTrait>,
        roles: Arc<dyn RoleRepositoryTrait>,
        resets: Arc<dyn PasswordResetRepositoryTrait>,
        mailer: Arc<dyn EmailTransport>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            users,
            roles,
            resets,
            mailer,
            jwt: JwtManager::new(JwtConfig::from(config)),
            reset_ttl: Duration::minutes(config.reset_token_ttl_minutes),
            app_url: config.app_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// 从存储中读取用户当前角色
    pub async fn role_of(&self, user: &User) -> Result<Role> {
        self.roles
            .get_role(user.role_id)
            .await?
            .ok_or_else(|| FeedbackError::Internal(format!("用户 {} 的角色不存在", user.id)))
    }

    // ============================================
    // 登录与鉴权
    // ============================================

    /// 邮箱密码登录
    ///
    /// 用户不存在与密码错误返回同一个错误。
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken> {
        let user = match self.users.find_by_email(&normalize_email(email)).await? {
            Some(user) if verify_password(password, &user.hashed_password)? => user,
            _ => {
                metrics::record_login(false);
                info!("登录失败");
                return Err(FeedbackError::InvalidCredentials);
            }
        };

        let role = self.role_of(&user).await?;
        let token = self.jwt.generate_token(user.id, role.capability)?;

        metrics::record_login(true);
        info!(user_id = user.id, role = %role.capability, "登录成功");
        Ok(token)
    }

    /// 解析 Bearer Token 对应的用户
    pub async fn resolve_user(&self, token: Option<&str>) -> Result<User> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(FeedbackError::Unauthenticated)?;
        let claims = self.jwt.verify_token(token)?;
        let user_id = claims.user_id()?;

        self.users
            .get_user(user_id)
            .await?
            .ok_or(FeedbackError::UserNotFound)
    }

    /// 校验用户当前角色是否具备权限，角色从存储中重新读取
    pub async fn authorize(&self, user: &User, permission: Permission) -> Result<Role> {
        let role = self.role_of(user).await?;
        if role.capability.allows(permission) {
            Ok(role)
        } else {
            debug!(user_id = user.id, permission = ?permission, "权限不足");
            Err(FeedbackError::Forbidden)
        }
    }

    pub async fn require_admin(&self, token: Option<&str>) -> Result<User> {
        let user = self.resolve_user(token).await?;
        self.authorize(&user, Permission::ManageUsers).await?;
        Ok(user)
    }

    // ============================================
    // 密码重置
    // ============================================

    /// 发起密码重置
    ///
    /// 无论邮箱是否存在都返回相同消息；邮件在后台任务中发送。
    #[instrument(skip(self))]
    pub async fn initiate_password_reset(&self, email: &str) -> Result<&'static str> {
        let Some(user) = self.users.find_by_email(&normalize_email(email)).await? else {
            metrics::record_password_reset("initiate", "unknown_email");
            debug!("找回密码的邮箱未注册");
            return Ok(RESET_REQUESTED_MESSAGE);
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + self.reset_ttl;
        self.resets
            .replace_for_user(user.id, &token, expires_at)
            .await?;

        let link = format!("{}/reset-password?token={}", self.app_url, token);
        let message = password_reset_email(&user.email, &user.full_name(), &link);
        let mailer = self.mailer.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            match mailer.send(&message).await {
                Ok(()) => info!(user_id = user_id, "密码重置邮件已发送"),
                Err(e) => warn!(user_id = user_id, error = %e, "密码重置邮件发送失败"),
            }
        });

        metrics::record_password_reset("initiate", "issued");
        info!(user_id = user.id, %expires_at, "已签发密码重置令牌");
        Ok(RESET_REQUESTED_MESSAGE)
    }

    /// 使用重置令牌设置新密码，令牌只能使用一次
    #[instrument(skip(self, token, new_password))]
    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<&'static str> {
        validate_new_password(new_password)?;
        let hashed = hash_password(new_password)?;

        match self.resets.consume(token.trim(), Utc::now(), &hashed).await? {
            ResetConsumption::Consumed { user_id } => {
                metrics::record_password_reset("complete", "success");
                info!(user_id = user_id, "密码已重置");
                Ok(PASSWORD_UPDATED_MESSAGE)
            }
            ResetConsumption::Expired => {
                metrics::record_password_reset("complete", "expired");
                Err(FeedbackError::ResetTokenExpired)
            }
            ResetConsumption::Unknown => {
                metrics::record_password_reset("complete", "invalid");
                Err(FeedbackError::ResetTokenInvalid)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PasswordReset, RoleCapability};
    use crate::notification::email::MockEmailTransport;
    use crate::repository::{
        MockPasswordResetRepositoryTrait, MockRoleRepositoryTrait, MockUserRepositoryTrait,
    };

    fn user(id: i64, role_id: i64, password: &str) -> User {
        User {
            id,
            first_name: "Анна".to_string(),
            second_name: "Петрова".to_string(),
            email: "anna@example.com".to_string(),
            hashed_password: hash_password(password).unwrap(),
            role_id,
            active: true,
        }
    }

    fn roles() -> MockRoleRepositoryTrait {
        let mut roles = MockRoleRepositoryTrait::new();
        roles.expect_get_role().returning(|id| {
            let capability = match id {
                1 => RoleCapability::Admin,
                2 => RoleCapability::Manager,
                _ => RoleCapability::Staff,
            };
            Ok(Some(Role {
                id,
                name: capability.to_string(),
                capability,
            }))
        });
        roles
    }

    fn service(
        users: MockUserRepositoryTrait,
        resets: MockPasswordResetRepositoryTrait,
        mailer: MockEmailTransport,
    ) -> AuthService {
        AuthService::new(
            Arc::new(users),
            Arc::new(roles()),
            Arc::new(resets),
            Arc::new(mailer),
            &AuthConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_login_and_resolve() {
        let stored = user(7, 2, "correct-horse");
        let mut users = MockUserRepositoryTrait::new();
        let by_email = stored.clone();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(by_email.clone())));
        let by_id = stored.clone();
        users
            .expect_get_user()
            .returning(move |_| Ok(Some(by_id.clone())));

        let svc = service(
            users,
            MockPasswordResetRepositoryTrait::new(),
            MockEmailTransport::new(),
        );

        let token = svc.login("anna@example.com", "correct-horse").await.unwrap();
        let resolved = svc.resolve_user(Some(&token.access_token)).await.unwrap();
        assert_eq!(resolved.id, 7);

        // 经理不能执行管理员操作
        let err = svc.require_admin(Some(&token.access_token)).await.unwrap_err();
        assert!(matches!(err, FeedbackError::Forbidden));
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email_look_the_same() {
        let stored = user(7, 1, "correct-horse");
        let mut users = MockUserRepositoryTrait::new();
        users.expect_find_by_email().returning(move |email| {
            Ok((email == "anna@example.com").then(|| stored.clone()))
        });
        let svc = service(
            users,
            MockPasswordResetRepositoryTrait::new(),
            MockEmailTransport::new(),
        );

        let wrong = svc.login("anna@example.com", "nope").await.unwrap_err();
        let unknown = svc.login("ghost@example.com", "nope").await.unwrap_err();
        assert!(matches!(wrong, FeedbackError::InvalidCredentials));
        assert!(matches!(unknown, FeedbackError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_resolve_user_errors() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_get_user().returning(|_| Ok(None));
        let svc = service(
            users,
            MockPasswordResetRepositoryTrait::new(),
            MockEmailTransport::new(),
        );

        assert!(matches!(
            svc.resolve_user(None).await.unwrap_err(),
            FeedbackError::Unauthenticated
        ));
        assert!(matches!(
            svc.resolve_user(Some("garbage")).await.unwrap_err(),
            FeedbackError::TokenInvalid
        ));

        let token = svc.jwt().generate_token(99, RoleCapability::Admin).unwrap();
        assert!(matches!(
            svc.resolve_user(Some(&token.access_token)).await.unwrap_err(),
            FeedbackError::UserNotFound
        ));
    }

    #[tokio::test]
    async fn test_reset_for_unknown_email_is_silent() {
        let mut users = MockUserRepositoryTrait::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let mut resets = MockPasswordResetRepositoryTrait::new();
        resets.expect_replace_for_user().never();
        let mut mailer = MockEmailTransport::new();
        mailer.expect_send().never();

        let svc = service(users, resets, mailer);
        let msg = svc.initiate_password_reset("ghost@example.com").await.unwrap();
        assert_eq!(msg, RESET_REQUESTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_reset_issues_token_with_ttl() {
        let stored = user(3, 3, "whatever-123");
        let mut users = MockUserRepositoryTrait::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(stored.clone())));
        let mut resets = MockPasswordResetRepositoryTrait::new();
        resets
            .expect_replace_for_user()
            .withf(|user_id, token, expires_at| {
                let ttl = *expires_at - Utc::now();
                *user_id == 3
                    && token.len() == 64
                    && ttl > Duration::minutes(59)
                    && ttl <= Duration::minutes(60)
            })
            .times(1)
            .returning(|user_id, token, expires_at| {
                Ok(PasswordReset {
                    id: 1,
                    user_id,
                    token: token.to_string(),
                    expires_at,
                    created_at: Utc::now(),
                })
            });
        let mut mailer = MockEmailTransport::new();
        mailer.expect_send().returning(|_| Ok(()));

        let svc = service(users, resets, mailer);
        let msg = svc.initiate_password_reset("anna@example.com").await.unwrap();
        assert_eq!(msg, RESET_REQUESTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_complete_reset_maps_consumption() {
        let cases = [
            (ResetConsumption::Consumed { user_id: 1 }, None),
            (ResetConsumption::Expired, Some("RESET_TOKEN_EXPIRED")),
            (ResetConsumption::Unknown, Some("RESET_TOKEN_INVALID")),
        ];

        for (consumption, expected_code) in cases {
            let mut resets = MockPasswordResetRepositoryTrait::new();
            resets
                .expect_consume()
                .returning(move |_, _, _| Ok(consumption));
            let svc = service(MockUserRepositoryTrait::new(), resets, MockEmailTransport::new());

            let result = svc.complete_password_reset("token", "new-password-1").await;
            match expected_code {
                None => assert_eq!(result.unwrap(), PASSWORD_UPDATED_MESSAGE),
                Some(code) => assert_eq!(result.unwrap_err().error_code(), code),
            }
        }
    }

    #[tokio::test]
    async fn test_complete_reset_rejects_short_password_before_consuming() {
        let mut resets = MockPasswordResetRepositoryTrait::new();
        resets.expect_consume().never();
        let svc = service(MockUserRepositoryTrait::new(), resets, MockEmailTransport::new());

        let err = svc.complete_password_reset("token", "short").await.unwrap_err();
        assert!(matches!(err, FeedbackError::Validation(_)));
    }
}
