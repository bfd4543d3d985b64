//! 注册申请审批流程
//!
//! pending -> approved（同时创建用户）或 pending -> rejected，终态不可再变更。

use std::sync::Arc;

use hrm_shared::config::RegistrationConfig;
use hrm_shared::observability::metrics;
use tracing::{info, instrument};

use crate::auth::{hash_password, validate_new_password};
use crate::error::{FeedbackError, Result};
use crate::models::{
    NewRegistrationRequest, RegistrationDecision, RegistrationOutcome, RegistrationRequest,
};
use crate::repository::{RegistrationRepositoryTrait, RoleRepositoryTrait, UserRepositoryTrait};
use crate::service::user_service::{normalize_email, required_name};

/// 注册申请提交输入
#[derive(Debug, Clone)]
pub struct SubmitRegistration {
    pub first_name: String,
    pub second_name: String,
    pub email: String,
    pub password: String,
    pub role_id: i64,
}

pub struct RegistrationService {
    requests: Arc<dyn RegistrationRepositoryTrait>,
    users: Arc<dyn UserRepositoryTrait>,
    roles: Arc<dyn RoleRepositoryTrait>,
    activate_on_approval: bool,
}

impl RegistrationService {
    pub fn new(
        requests: Arc<dyn RegistrationRepositoryTrait>,
        users: Arc<dyn UserRepositoryTrait>,
        roles: Arc<dyn RoleRepositoryTrait>,
        config: &RegistrationConfig,
    ) -> Self {
        Self {
            requests,
            users,
            roles,
            activate_on_approval: config.activate_on_approval,
        }
    }

    /// 提交注册申请；邮箱与已有用户冲突时返回 Conflict
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn submit(&self, input: SubmitRegistration) -> Result<RegistrationRequest> {
        validate_new_password(&input.password)?;
        if self.roles.get_role(input.role_id).await?.is_none() {
            return Err(FeedbackError::Validation(format!(
                "角色不存在: {}",
                input.role_id
            )));
        }

        let email = normalize_email(&input.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(FeedbackError::Conflict(format!("邮箱已被使用: {email}")));
        }

        // 申请表上的唯一约束兜底重复申请
        let request = self
            .requests
            .create_request(&NewRegistrationRequest {
                first_name: required_name("first_name", &input.first_name)?,
                second_name: required_name("second_name", &input.second_name)?,
                email,
                hashed_password: hash_password(&input.password)?,
                role_id: input.role_id,
            })
            .await?;

        info!(request_id = request.id, "注册申请已提交");
        Ok(request)
    }

    pub async fn list(&self) -> Result<Vec<RegistrationRequest>> {
        self.requests.list_requests().await
    }

    pub async fn get(&self, id: i64) -> Result<RegistrationRequest> {
        self.requests
            .get_request(id)
            .await?
            .ok_or_else(|| FeedbackError::not_found("registration_request", id))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.requests.delete_request(id).await? {
            return Err(FeedbackError::not_found("registration_request", id));
        }
        info!(request_id = id, "注册申请已删除");
        Ok(())
    }

    /// 审批申请
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        id: i64,
        decision: RegistrationDecision,
        admin_id: i64,
    ) -> Result<RegistrationOutcome> {
        let outcome = self
            .requests
            .resolve(id, decision, admin_id, self.activate_on_approval)
            .await?;

        metrics::record_registration_resolution(decision.target_status().as_str());
        info!(
            request_id = id,
            admin_id = admin_id,
            status = %outcome.request.status,
            user_id = outcome.user.as_ref().map(|u| u.id),
            "注册申请已处理"
        );
        Ok(outcome)
    }
}
