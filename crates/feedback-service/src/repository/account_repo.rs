//! 密码重置与注册申请仓储
//!
//! 两者都需要在单个事务内修改多张表。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::traits::{PasswordResetRepositoryTrait, RegistrationRepositoryTrait};
use crate::error::{FeedbackError, Result};
use crate::models::{
    NewRegistrationRequest, PasswordReset, RegistrationDecision, RegistrationOutcome,
    RegistrationRequest, ResetConsumption, User,
};

const RESET_COLUMNS: &str = "id, user_id, token, expires_at, created_at";
const REQUEST_COLUMNS: &str =
    "id, first_name, second_name, email, hashed_password, role_id, status, admin_id, created_at";

/// 密码重置令牌仓储
pub struct PasswordResetRepository {
    pool: PgPool,
}

impl PasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordResetRepositoryTrait for PasswordResetRepository {
    async fn replace_for_user(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let reset = sqlx::query_as::<_, PasswordReset>(&format!(
            r#"
            INSERT INTO password_resets (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING {RESET_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            user_id = user_id,
            replaced = removed.rows_affected(),
            "重置令牌已写入"
        );
        Ok(reset)
    }

    async fn consume(
        &self,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> Result<ResetConsumption> {
        let mut tx = self.pool.begin().await?;

        // 删除并取回，保证令牌只能被一个请求消费
        let reset = sqlx::query_as::<_, PasswordReset>(&format!(
            "DELETE FROM password_resets WHERE token = $1 RETURNING {RESET_COLUMNS}"
        ))
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(reset) = reset else {
            tx.rollback().await?;
            return Ok(ResetConsumption::Unknown);
        };

        if reset.is_expired_at(now) {
            tx.commit().await?;
            return Ok(ResetConsumption::Expired);
        }

        let updated = sqlx::query("UPDATE users SET hashed_password = $2 WHERE id = $1")
            .bind(reset.user_id)
            .bind(new_password_hash)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            tx.commit().await?;
            return Ok(ResetConsumption::Unknown);
        }

        tx.commit().await?;
        Ok(ResetConsumption::Consumed {
            user_id: reset.user_id,
        })
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>> {
        let reset = sqlx::query_as::<_, PasswordReset>(&format!(
            "SELECT {RESET_COLUMNS} FROM password_resets WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reset)
    }
}

/// 注册申请仓储
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationRepositoryTrait for RegistrationRepository {
    async fn create_request(&self, request: &NewRegistrationRequest) -> Result<RegistrationRequest> {
        let created = sqlx::query_as::<_, RegistrationRequest>(&format!(
            r#"
            INSERT INTO registration_requests
                (first_name, second_name, email, hashed_password, role_id, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(&request.first_name)
        .bind(&request.second_name)
        .bind(&request.email)
        .bind(&request.hashed_password)
        .bind(request.role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_request(&self, id: i64) -> Result<Option<RegistrationRequest>> {
        let request = sqlx::query_as::<_, RegistrationRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM registration_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn list_requests(&self) -> Result<Vec<RegistrationRequest>> {
        let requests = sqlx::query_as::<_, RegistrationRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM registration_requests
            ORDER BY (status = 'pending') DESC, id
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn delete_request(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM registration_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn resolve(
        &self,
        id: i64,
        decision: RegistrationDecision,
        admin_id: i64,
        activate_user: bool,
    ) -> Result<RegistrationOutcome> {
        let mut tx = self.pool.begin().await?;

        // 行锁保证并发审批只有一个能看到 pending
        let current = sqlx::query_as::<_, RegistrationRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM registration_requests WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| FeedbackError::not_found("registration_request", id))?;

        if !current.status.is_pending() {
            return Err(FeedbackError::InvalidStateTransition {
                id,
                status: current.status.to_string(),
            });
        }

        let request = sqlx::query_as::<_, RegistrationRequest>(&format!(
            r#"
            UPDATE registration_requests
            SET status = $2, admin_id = $3
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(decision.target_status())
        .bind(admin_id)
        .fetch_one(&mut *tx)
        .await?;

        let user = match decision {
            RegistrationDecision::Approve => {
                let new_user = request.to_new_user(activate_user);
                let user = sqlx::query_as::<_, User>(
                    r#"
                    INSERT INTO users (first_name, second_name, email, hashed_password, role_id, active)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id, first_name, second_name, email, hashed_password, role_id, active
                    "#,
                )
                .bind(&new_user.first_name)
                .bind(&new_user.second_name)
                .bind(&new_user.email)
                .bind(&new_user.hashed_password)
                .bind(new_user.role_id)
                .bind(new_user.active)
                .fetch_one(&mut *tx)
                .await?;
                Some(user)
            }
            RegistrationDecision::Reject => None,
        };

        tx.commit().await?;

        Ok(RegistrationOutcome { request, user })
    }
}
