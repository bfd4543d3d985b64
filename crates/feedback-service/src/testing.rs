//! 测试工具模块
//!
//! 提供仓储 trait 的内存实现以及可录制的消息/邮件传输，
//! 用于集成测试与 HTTP 路由测试，无需数据库与外部网络。

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Notify, RwLock};
use uuid::Uuid;

use crate::error::{FeedbackError, Result};
use crate::models::{
    Category, CategoryKind, CategoryPatch, Contact, Feedback, FeedbackComment, FeedbackDraft,
    FeedbackType, NewCategory, NewRegistrationRequest, NewTag, NewUser, PasswordReset,
    Rating, RegistrationDecision, RegistrationOutcome, RegistrationRequest, RegistrationStatus,
    ResetConsumption, Role, RoleCapability, ScoreFilter, Tag, TagPatch, User, UserPatch,
    WaiterScore,
};
use crate::notification::{
    ChatDestination, ChatDestinationStore, EmailMessage, EmailTransport, MessageTransport,
};
use crate::notification::destinations::normalize_chat_id;
use crate::pagination::{CommentQuery, UserListQuery, UserSortField};
use crate::repository::{
    FeedbackRepositoryTrait, PasswordResetRepositoryTrait, RegistrationRepositoryTrait,
    RoleRepositoryTrait, TaxonomyRepositoryTrait, UserRepositoryTrait, WaiterScoreRepositoryTrait,
};

pub const ADMIN_ROLE_ID: i64 = 1;
pub const MANAGER_ROLE_ID: i64 = 2;
pub const STAFF_ROLE_ID: i64 = 3;

// ==================== 内存存储 ====================

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    roles: Vec<Role>,
    users: Vec<User>,
    resets: Vec<PasswordReset>,
    requests: Vec<RegistrationRequest>,
    categories: Vec<Category>,
    tags: Vec<Tag>,
    feedback_types: Vec<FeedbackType>,
    feedbacks: Vec<Feedback>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn insert_user(&mut self, user: &NewUser) -> Result<User> {
        if self.email_taken(&user.email, None) {
            return Err(FeedbackError::Conflict("违反唯一约束 users_email_key".to_string()));
        }
        if !self.roles.iter().any(|r| r.id == user.role_id) {
            return Err(FeedbackError::Validation("引用的记录不存在或仍被其他记录引用".to_string()));
        }
        let created = User {
            id: self.next_id(),
            first_name: user.first_name.clone(),
            second_name: user.second_name.clone(),
            email: user.email.clone(),
            hashed_password: user.hashed_password.clone(),
            role_id: user.role_id,
            active: user.active,
        };
        self.users.push(created.clone());
        Ok(created)
    }
}

fn compare_users(a: &User, b: &User, field: UserSortField) -> Ordering {
    let primary = match field {
        UserSortField::Id => a.id.cmp(&b.id),
        UserSortField::FirstName => a.first_name.cmp(&b.first_name),
        UserSortField::SecondName => a.second_name.cmp(&b.second_name),
        UserSortField::Email => a.email.cmp(&b.email),
        UserSortField::RoleId => a.role_id.cmp(&b.role_id),
        UserSortField::Active => a.active.cmp(&b.active),
    };
    primary.then(a.id.cmp(&b.id))
}

/// 实现全部仓储 trait 的内存存储
///
/// 语义与 PostgreSQL 实现一致：唯一约束返回 Conflict，级联删除子记录，
/// 游标行不存在时返回空页。克隆共享同一份数据。
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置三种角色与三个分类，id 与初始迁移一致
    pub async fn seeded() -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write().await;
            state.roles = vec![
                Role {
                    id: ADMIN_ROLE_ID,
                    name: "админ".to_string(),
                    capability: RoleCapability::Admin,
                },
                Role {
                    id: MANAGER_ROLE_ID,
                    name: "менеджер".to_string(),
                    capability: RoleCapability::Manager,
                },
                Role {
                    id: STAFF_ROLE_ID,
                    name: "официант".to_string(),
                    capability: RoleCapability::Staff,
                },
            ];
            state.categories = vec![
                Category {
                    id: 1,
                    name: "положительный".to_string(),
                    kind: Some(CategoryKind::Positive),
                },
                Category {
                    id: 2,
                    name: "нейтральный".to_string(),
                    kind: Some(CategoryKind::Neutral),
                },
                Category {
                    id: 3,
                    name: "отрицательный".to_string(),
                    kind: Some(CategoryKind::Negative),
                },
            ];
            state.next_id = 100;
        }
        store
    }

    /// 直接写入用户（密码为明文，内部哈希）
    pub async fn seed_user(
        &self,
        first_name: &str,
        second_name: &str,
        email: &str,
        password: &str,
        role_id: i64,
    ) -> User {
        let hashed_password =
            crate::auth::hash_password(password).unwrap_or_else(|e| panic!("hash failed: {e}"));
        self.seed_user_with_hash(first_name, second_name, email, &hashed_password, role_id)
            .await
    }

    /// 直接写入用户，跳过 bcrypt 以加快大批量数据准备
    pub async fn seed_user_with_hash(
        &self,
        first_name: &str,
        second_name: &str,
        email: &str,
        hashed_password: &str,
        role_id: i64,
    ) -> User {
        let mut state = self.state.write().await;
        state
            .insert_user(&NewUser {
                first_name: first_name.to_string(),
                second_name: second_name.to_string(),
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
                role_id,
                active: true,
            })
            .unwrap_or_else(|e| panic!("seed user failed: {e}"))
    }

    pub async fn reset_tokens_for(&self, user_id: i64) -> Vec<PasswordReset> {
        let state = self.state.read().await;
        state
            .resets
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryStore {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self, query: &UserListQuery) -> Result<Vec<User>> {
        let state = self.state.read().await;

        let cursor_row = match query.cursor {
            Some(id) => match state.users.iter().find(|u| u.id == id) {
                Some(row) => Some(row.clone()),
                None => return Err(FeedbackError::stale_cursor(id)),
            },
            None => None,
        };

        let mut rows: Vec<User> = state
            .users
            .iter()
            .filter(|u| query.role_id.is_none_or(|r| u.role_id == r))
            .filter(|u| query.active.is_none_or(|a| u.active == a))
            .filter(|u| match &cursor_row {
                Some(c) => {
                    let ord = compare_users(u, c, query.sort_by);
                    if query.ascending {
                        ord == Ordering::Greater
                    } else {
                        ord == Ordering::Less
                    }
                }
                None => true,
            })
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ord = compare_users(a, b, query.sort_by);
            if query.ascending { ord } else { ord.reverse() }
        });
        rows.truncate(query.limit.max(0) as usize);
        Ok(rows)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.state.write().await.insert_user(user)
    }

    async fn update_user(&self, id: i64, patch: &UserPatch) -> Result<Option<User>> {
        let mut state = self.state.write().await;
        if let Some(email) = &patch.email {
            if state.email_taken(email, Some(id)) {
                return Err(FeedbackError::Conflict("违反唯一约束 users_email_key".to_string()));
            }
        }
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        patch.apply(user);
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        state.resets.retain(|r| r.user_id != id);
        Ok(state.users.len() < before)
    }
}

#[async_trait]
impl RoleRepositoryTrait for InMemoryStore {
    async fn list_roles(&self) -> Result<Vec<Role>> {
        Ok(self.state.read().await.roles.clone())
    }

    async fn get_role(&self, id: i64) -> Result<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.iter().find(|r| r.id == id).cloned())
    }
}

#[async_trait]
impl PasswordResetRepositoryTrait for InMemoryStore {
    async fn replace_for_user(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordReset> {
        let mut state = self.state.write().await;
        if state.resets.iter().any(|r| r.token == token) {
            return Err(FeedbackError::Conflict("违反唯一约束 password_resets_token_key".to_string()));
        }
        state.resets.retain(|r| r.user_id != user_id);
        let reset = PasswordReset {
            id: state.next_id(),
            user_id,
            token: token.to_string(),
            expires_at,
            created_at: Utc::now(),
        };
        state.resets.push(reset.clone());
        Ok(reset)
    }

    async fn consume(
        &self,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> Result<ResetConsumption> {
        let mut state = self.state.write().await;
        let Some(pos) = state.resets.iter().position(|r| r.token == token) else {
            return Ok(ResetConsumption::Unknown);
        };
        let reset = state.resets.remove(pos);
        if reset.is_expired_at(now) {
            return Ok(ResetConsumption::Expired);
        }
        match state.users.iter_mut().find(|u| u.id == reset.user_id) {
            Some(user) => {
                user.hashed_password = new_password_hash.to_string();
                Ok(ResetConsumption::Consumed {
                    user_id: reset.user_id,
                })
            }
            None => Ok(ResetConsumption::Unknown),
        }
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<PasswordReset>> {
        let state = self.state.read().await;
        Ok(state.resets.iter().find(|r| r.token == token).cloned())
    }
}

#[async_trait]
impl RegistrationRepositoryTrait for InMemoryStore {
    async fn create_request(&self, request: &NewRegistrationRequest) -> Result<RegistrationRequest> {
        let mut state = self.state.write().await;
        if state.requests.iter().any(|r| r.email == request.email) {
            return Err(FeedbackError::Conflict(
                "违反唯一约束 registration_requests_email_key".to_string(),
            ));
        }
        let created = RegistrationRequest {
            id: state.next_id(),
            first_name: request.first_name.clone(),
            second_name: request.second_name.clone(),
            email: request.email.clone(),
            hashed_password: request.hashed_password.clone(),
            role_id: request.role_id,
            status: RegistrationStatus::Pending,
            admin_id: None,
            created_at: Utc::now(),
        };
        state.requests.push(created.clone());
        Ok(created)
    }

    async fn get_request(&self, id: i64) -> Result<Option<RegistrationRequest>> {
        let state = self.state.read().await;
        Ok(state.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests(&self) -> Result<Vec<RegistrationRequest>> {
        let mut requests = self.state.read().await.requests.clone();
        requests.sort_by_key(|r| (!r.status.is_pending(), r.id));
        Ok(requests)
    }

    async fn delete_request(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.requests.len();
        state.requests.retain(|r| r.id != id);
        Ok(state.requests.len() < before)
    }

    async fn resolve(
        &self,
        id: i64,
        decision: RegistrationDecision,
        admin_id: i64,
        activate_user: bool,
    ) -> Result<RegistrationOutcome> {
        let mut state = self.state.write().await;
        let current = state
            .requests
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| FeedbackError::not_found("registration_request", id))?;

        if !current.status.is_pending() {
            return Err(FeedbackError::InvalidStateTransition {
                id,
                status: current.status.to_string(),
            });
        }

        // 先创建用户，失败时申请保持 pending
        let user = match decision {
            RegistrationDecision::Approve => {
                Some(state.insert_user(&current.to_new_user(activate_user))?)
            }
            RegistrationDecision::Reject => None,
        };

        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| FeedbackError::not_found("registration_request", id))?;
        request.status = decision.target_status();
        request.admin_id = Some(admin_id);

        Ok(RegistrationOutcome {
            request: request.clone(),
            user,
        })
    }
}

#[async_trait]
impl FeedbackRepositoryTrait for InMemoryStore {
    async fn create_feedback(&self, draft: &FeedbackDraft) -> Result<Feedback> {
        let mut state = self.state.write().await;
        let id = state.next_id();

        let contact = match &draft.contact {
            Some(phone) => Some(Contact {
                id: state.next_id(),
                phone: phone.clone(),
                feedback_id: id,
            }),
            None => None,
        };
        let waiter_score = match &draft.waiter_score {
            Some(s) => Some(WaiterScore {
                id: state.next_id(),
                waiter_id: s.waiter_id,
                score: s.score,
                comment: s.comment.clone(),
                tag_id: s.tag_id,
                category_id: s.category_id,
                feedback_id: id,
            }),
            None => None,
        };
        let mut ratings = Vec::with_capacity(draft.ratings.len());
        for r in &draft.ratings {
            ratings.push(Rating {
                id: state.next_id(),
                rating: r.rating,
                feedback_type_id: r.feedback_type_id,
                feedback_id: id,
            });
        }

        let feedback = Feedback {
            id,
            created_at: draft.created_at,
            is_notified: false,
            contact,
            waiter_score,
            ratings,
        };
        state.feedbacks.push(feedback.clone());
        Ok(feedback)
    }

    async fn get_feedback(&self, id: i64) -> Result<Option<Feedback>> {
        let state = self.state.read().await;
        Ok(state.feedbacks.iter().find(|f| f.id == id).cloned())
    }

    async fn list_feedbacks(&self, cursor: Option<i64>, limit: i64) -> Result<Vec<Feedback>> {
        let state = self.state.read().await;
        let mut rows: Vec<Feedback> = state
            .feedbacks
            .iter()
            .filter(|f| cursor.is_none_or(|c| f.id < c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn delete_feedback(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.feedbacks.len();
        state.feedbacks.retain(|f| f.id != id);
        Ok(state.feedbacks.len() < before)
    }

    async fn list_comments(&self, query: &CommentQuery) -> Result<Vec<FeedbackComment>> {
        let state = self.state.read().await;

        let mut rows: Vec<FeedbackComment> = state
            .feedbacks
            .iter()
            .filter_map(|f| {
                let score = f.waiter_score.as_ref()?;
                Some(FeedbackComment {
                    feedback_id: f.id,
                    waiter_id: score.waiter_id,
                    score: score.score,
                    comment: score.comment.clone(),
                    created_at: f.created_at,
                })
            })
            .filter(|c| query.matches(c.waiter_id, c.created_at))
            .filter(|c| match query.cursor {
                Some(cursor) if query.ascending => c.feedback_id > cursor,
                Some(cursor) => c.feedback_id < cursor,
                None => true,
            })
            .collect();

        rows.sort_by_key(|c| c.feedback_id);
        if !query.ascending {
            rows.reverse();
        }
        rows.truncate(query.limit.max(0) as usize);
        Ok(rows)
    }

    async fn mark_notified(&self, id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(f) = state.feedbacks.iter_mut().find(|f| f.id == id) {
            f.is_notified = true;
        }
        Ok(())
    }
}

#[async_trait]
impl WaiterScoreRepositoryTrait for InMemoryStore {
    async fn count_scores(&self, waiter_id: i64, filter: ScoreFilter) -> Result<i64> {
        let state = self.state.read().await;
        let count = state
            .feedbacks
            .iter()
            .filter_map(|f| f.waiter_score.as_ref())
            .filter(|s| s.waiter_id == waiter_id)
            .filter(|s| match filter {
                ScoreFilter::All => true,
                ScoreFilter::Category(id) => s.category_id == id,
                ScoreFilter::Tag(id) => s.tag_id == id,
            })
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl TaxonomyRepositoryTrait for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.state.read().await.categories.clone())
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let state = self.state.read().await;
        Ok(state.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_category_by_kind(&self, kind: CategoryKind) -> Result<Option<Category>> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .iter()
            .find(|c| c.kind == Some(kind))
            .cloned())
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        let mut state = self.state.write().await;
        if category.kind.is_some() && state.categories.iter().any(|c| c.kind == category.kind) {
            return Err(FeedbackError::Conflict("违反唯一约束 categories_kind_key".to_string()));
        }
        let created = Category {
            id: state.next_id(),
            name: category.name.clone(),
            kind: category.kind,
        };
        state.categories.push(created.clone());
        Ok(created)
    }

    async fn update_category(&self, id: i64, patch: &CategoryPatch) -> Result<Option<Category>> {
        let mut state = self.state.write().await;
        if patch.kind.is_some()
            && state
                .categories
                .iter()
                .any(|c| c.id != id && c.kind == patch.kind)
        {
            return Err(FeedbackError::Conflict("违反唯一约束 categories_kind_key".to_string()));
        }
        let Some(category) = state.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            category.name = name.clone();
        }
        if patch.kind.is_some() {
            category.kind = patch.kind;
        }
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        state.tags.retain(|t| t.category_id != id);
        Ok(state.categories.len() < before)
    }

    async fn list_tags(&self, category_id: Option<i64>) -> Result<Vec<Tag>> {
        let state = self.state.read().await;
        Ok(state
            .tags
            .iter()
            .filter(|t| category_id.is_none_or(|c| t.category_id == c))
            .cloned()
            .collect())
    }

    async fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let state = self.state.read().await;
        Ok(state.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag> {
        let mut state = self.state.write().await;
        if !state.categories.iter().any(|c| c.id == tag.category_id) {
            return Err(FeedbackError::Validation("引用的记录不存在或仍被其他记录引用".to_string()));
        }
        let created = Tag {
            id: state.next_id(),
            name: tag.name.clone(),
            category_id: tag.category_id,
        };
        state.tags.push(created.clone());
        Ok(created)
    }

    async fn update_tag(&self, id: i64, patch: &TagPatch) -> Result<Option<Tag>> {
        let mut state = self.state.write().await;
        let Some(tag) = state.tags.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            tag.name = name.clone();
        }
        if let Some(category_id) = patch.category_id {
            tag.category_id = category_id;
        }
        Ok(Some(tag.clone()))
    }

    async fn delete_tag(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.tags.len();
        state.tags.retain(|t| t.id != id);
        Ok(state.tags.len() < before)
    }

    async fn list_feedback_types(&self) -> Result<Vec<FeedbackType>> {
        Ok(self.state.read().await.feedback_types.clone())
    }

    async fn get_feedback_type(&self, id: i64) -> Result<Option<FeedbackType>> {
        let state = self.state.read().await;
        Ok(state.feedback_types.iter().find(|t| t.id == id).cloned())
    }

    async fn create_feedback_type(&self, name: &str) -> Result<FeedbackType> {
        let mut state = self.state.write().await;
        let created = FeedbackType {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.feedback_types.push(created.clone());
        Ok(created)
    }

    async fn update_feedback_type(&self, id: i64, name: &str) -> Result<Option<FeedbackType>> {
        let mut state = self.state.write().await;
        let Some(feedback_type) = state.feedback_types.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        feedback_type.name = name.to_string();
        Ok(Some(feedback_type.clone()))
    }

    async fn delete_feedback_type(&self, id: i64) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.feedback_types.len();
        state.feedback_types.retain(|t| t.id != id);
        Ok(state.feedback_types.len() < before)
    }
}

// ==================== 推送目标 ====================

/// 内存推送目标存储
#[derive(Default)]
pub struct InMemoryDestinationStore {
    destinations: RwLock<Vec<ChatDestination>>,
}

impl InMemoryDestinationStore {
    pub fn with_chat_ids(chat_ids: &[&str]) -> Self {
        let destinations = chat_ids
            .iter()
            .map(|chat_id| ChatDestination {
                id: Uuid::now_v7().to_string(),
                chat_id: chat_id.to_string(),
            })
            .collect();
        Self {
            destinations: RwLock::new(destinations),
        }
    }
}

#[async_trait]
impl ChatDestinationStore for InMemoryDestinationStore {
    async fn list(&self) -> Result<Vec<ChatDestination>> {
        Ok(self.destinations.read().await.clone())
    }

    async fn add(&self, chat_id: &str) -> Result<ChatDestination> {
        let chat_id = normalize_chat_id(chat_id)?;
        let mut destinations = self.destinations.write().await;
        if destinations.iter().any(|d| d.chat_id == chat_id) {
            return Err(FeedbackError::Conflict(format!("chat_id 已存在: {chat_id}")));
        }
        let destination = ChatDestination {
            id: Uuid::now_v7().to_string(),
            chat_id,
        };
        destinations.push(destination.clone());
        Ok(destination)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let mut destinations = self.destinations.write().await;
        let before = destinations.len();
        destinations.retain(|d| d.id != id);
        if destinations.len() == before {
            return Err(FeedbackError::not_found("chat_destination", id));
        }
        Ok(())
    }
}

// ==================== 录制传输 ====================

/// 录制每次投递尝试的消息传输
///
/// 可按 chat_id 预设失败或延迟。
#[derive(Default)]
pub struct RecordingTransport {
    delivered: RwLock<Vec<(String, String)>>,
    attempts: RwLock<usize>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    attempted: Notify,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, chat_id: &str) -> Self {
        self.failing.insert(chat_id.to_string());
        self
    }

    pub fn delayed_for(mut self, chat_id: &str, delay: Duration) -> Self {
        self.delays.insert(chat_id.to_string(), delay);
        self
    }

    /// 成功投递的 (chat_id, text)
    pub async fn delivered(&self) -> Vec<(String, String)> {
        self.delivered.read().await.clone()
    }

    pub async fn attempts(&self) -> usize {
        *self.attempts.read().await
    }

    /// 等待至少 `count` 次投递尝试完成，超时返回 false
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.attempts().await >= count {
                return true;
            }
            if tokio::time::timeout_at(deadline, self.attempted.notified())
                .await
                .is_err()
            {
                return self.attempts().await >= count;
            }
        }
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn deliver(&self, chat_id: &str, text: &str) -> Result<()> {
        if let Some(delay) = self.delays.get(chat_id) {
            tokio::time::sleep(*delay).await;
        }

        let result = if self.failing.contains(chat_id) {
            Err(FeedbackError::Delivery(format!("chat {chat_id} unavailable")))
        } else {
            self.delivered
                .write()
                .await
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        };

        *self.attempts.write().await += 1;
        self.attempted.notify_one();
        result
    }
}

/// 录制发出的邮件
#[derive(Default)]
pub struct RecordingEmailTransport {
    sent: RwLock<Vec<EmailMessage>>,
    sent_signal: Notify,
}

impl RecordingEmailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.read().await.clone()
    }

    /// 等待下一封邮件；已有邮件时立即返回
    pub async fn wait_for_email(&self, timeout: Duration) -> Option<EmailMessage> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(last) = self.sent.read().await.last().cloned() {
                return Some(last);
            }
            if tokio::time::timeout_at(deadline, self.sent_signal.notified())
                .await
                .is_err()
            {
                return self.sent.read().await.last().cloned();
            }
        }
    }
}

#[async_trait]
impl EmailTransport for RecordingEmailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent.write().await.push(message.clone());
        self.sent_signal.notify_one();
        Ok(())
    }
}

/// 从重置邮件的链接中取出令牌
pub fn token_from_reset_email(message: &EmailMessage) -> Option<String> {
    let start = message.html.find("token=")? + "token=".len();
    let token: String = message.html[start..]
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deleted_cursor_row_is_an_error() {
        let store = InMemoryStore::seeded().await;
        store
            .seed_user_with_hash("A", "B", "a@x.io", "h", STAFF_ROLE_ID)
            .await;

        let query = UserListQuery {
            cursor: Some(9999),
            ..Default::default()
        };
        let err = store.list_users(&query).await.unwrap_err();
        assert!(matches!(err, FeedbackError::Validation(_)));
    }

    #[tokio::test]
    async fn test_approval_conflict_keeps_request_pending() {
        let store = InMemoryStore::seeded().await;
        store
            .seed_user_with_hash("A", "B", "taken@x.io", "h", STAFF_ROLE_ID)
            .await;
        let request = store
            .create_request(&NewRegistrationRequest {
                first_name: "C".to_string(),
                second_name: "D".to_string(),
                email: "taken@x.io".to_string(),
                hashed_password: "h".to_string(),
                role_id: STAFF_ROLE_ID,
            })
            .await
            .unwrap();

        let err = store
            .resolve(request.id, RegistrationDecision::Approve, 1, true)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::Conflict(_)));
        let current = store.get_request(request.id).await.unwrap().unwrap();
        assert_eq!(current.status, RegistrationStatus::Pending);
    }

    #[test]
    fn test_token_from_reset_email() {
        let email = crate::notification::password_reset_email(
            "a@b.c",
            "A B",
            "http://localhost:3000/reset-password?token=AbC123",
        );
        assert_eq!(token_from_reset_email(&email).as_deref(), Some("AbC123"));
    }
}
