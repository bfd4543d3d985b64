//! 应用状态定义
//!
//! 包含 Axum 路由共享的服务实例。服务依赖仓储 trait，
//! 生产环境装配 PostgreSQL 实现，测试装配内存实现。

use std::sync::Arc;

use feedback_core::notification::{
    ChatDestinationStore, EmailTransport, MessageTransport, NotificationDispatcher,
};
use feedback_core::repository::{
    FeedbackRepository, FeedbackRepositoryTrait, PasswordResetRepository,
    PasswordResetRepositoryTrait, RegistrationRepository, RegistrationRepositoryTrait,
    RoleRepository, RoleRepositoryTrait, TaxonomyRepository, TaxonomyRepositoryTrait,
    UserRepository, UserRepositoryTrait, WaiterScoreRepositoryTrait,
};
use feedback_core::service::{
    AuthService, FeedbackService, RegistrationService, StatsService, TaxonomyService, UserService,
};
use feedback_core::testing::InMemoryStore;
use hrm_shared::config::AppConfig;
use hrm_shared::database::Database;
use sqlx::PgPool;

/// 全部仓储实现
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepositoryTrait>,
    pub roles: Arc<dyn RoleRepositoryTrait>,
    pub resets: Arc<dyn PasswordResetRepositoryTrait>,
    pub registrations: Arc<dyn RegistrationRepositoryTrait>,
    pub feedbacks: Arc<dyn FeedbackRepositoryTrait>,
    pub scores: Arc<dyn WaiterScoreRepositoryTrait>,
    pub taxonomy: Arc<dyn TaxonomyRepositoryTrait>,
}

impl Repositories {
    pub fn postgres(pool: &PgPool) -> Self {
        let feedbacks = Arc::new(FeedbackRepository::new(pool.clone()));
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            roles: Arc::new(RoleRepository::new(pool.clone())),
            resets: Arc::new(PasswordResetRepository::new(pool.clone())),
            registrations: Arc::new(RegistrationRepository::new(pool.clone())),
            feedbacks: feedbacks.clone(),
            scores: feedbacks,
            taxonomy: Arc::new(TaxonomyRepository::new(pool.clone())),
        }
    }

    pub fn in_memory(store: &InMemoryStore) -> Self {
        let store = Arc::new(store.clone());
        Self {
            users: store.clone(),
            roles: store.clone(),
            resets: store.clone(),
            registrations: store.clone(),
            feedbacks: store.clone(),
            scores: store.clone(),
            taxonomy: store,
        }
    }
}

/// 外部传输：推送目标存储、消息投递、邮件
#[derive(Clone)]
pub struct Transports {
    pub destinations: Arc<dyn ChatDestinationStore>,
    pub messages: Arc<dyn MessageTransport>,
    pub email: Arc<dyn EmailTransport>,
}

/// Axum 应用共享状态
///
/// 服务均以 Arc 持有，克隆开销只有引用计数。
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub registrations: Arc<RegistrationService>,
    pub feedbacks: Arc<FeedbackService>,
    pub taxonomy: Arc<TaxonomyService>,
    pub stats: Arc<StatsService>,
    pub destinations: Arc<dyn ChatDestinationStore>,
    /// 就绪探针使用；测试中为 None
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(config: &AppConfig, repos: Repositories, transports: Transports) -> Self {
        let dispatcher = NotificationDispatcher::new(
            transports.destinations.clone(),
            transports.messages,
            repos.users.clone(),
            repos.taxonomy.clone(),
            repos.feedbacks.clone(),
        )
        .with_config(&config.telegram);

        Self {
            auth: Arc::new(AuthService::new(
                repos.users.clone(),
                repos.roles.clone(),
                repos.resets,
                transports.email,
                &config.auth,
            )),
            users: Arc::new(UserService::new(repos.users.clone(), repos.roles.clone())),
            registrations: Arc::new(RegistrationService::new(
                repos.registrations,
                repos.users.clone(),
                repos.roles,
                &config.registration,
            )),
            feedbacks: Arc::new(FeedbackService::new(
                repos.feedbacks,
                repos.taxonomy.clone(),
                repos.users,
                Arc::new(dispatcher),
            )),
            taxonomy: Arc::new(TaxonomyService::new(repos.taxonomy.clone())),
            stats: Arc::new(StatsService::new(repos.scores, repos.taxonomy)),
            destinations: transports.destinations,
            database: None,
        }
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }
}
