//! 账户流程集成测试
//!
//! 覆盖登录鉴权、密码重置、注册审批与用户分页（使用内存仓储）

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use feedback_core::models::{RegistrationDecision, RegistrationStatus};
use feedback_core::pagination::{UserListQuery, UserSortField};
use feedback_core::repository::{PasswordResetRepositoryTrait, UserRepositoryTrait};
use feedback_core::service::{
    AuthService, PASSWORD_UPDATED_MESSAGE, RESET_REQUESTED_MESSAGE, RegistrationService,
    SubmitRegistration, UserService,
};
use feedback_core::testing::{
    ADMIN_ROLE_ID, InMemoryStore, MANAGER_ROLE_ID, RecordingEmailTransport, STAFF_ROLE_ID,
    token_from_reset_email,
};
use feedback_core::FeedbackError;
use hrm_shared::config::{AuthConfig, RegistrationConfig};

fn auth_service(store: &InMemoryStore, mailer: Arc<RecordingEmailTransport>) -> AuthService {
    let repo = Arc::new(store.clone());
    AuthService::new(repo.clone(), repo.clone(), repo, mailer, &AuthConfig::default())
}

// ==================== 登录与鉴权 ====================

#[tokio::test]
async fn test_login_and_role_checks() {
    let store = InMemoryStore::seeded().await;
    store
        .seed_user("Ирина", "Админова", "admin@zerno.ru", "admin-pass", ADMIN_ROLE_ID)
        .await;
    store
        .seed_user("Павел", "Менеджеров", "manager@zerno.ru", "manager-pass", MANAGER_ROLE_ID)
        .await;
    let auth = auth_service(&store, Arc::new(RecordingEmailTransport::new()));

    let admin_token = auth.login(" Admin@Zerno.ru ", "admin-pass").await.unwrap();
    let manager_token = auth.login("manager@zerno.ru", "manager-pass").await.unwrap();

    let admin = auth
        .require_admin(Some(&admin_token.access_token))
        .await
        .unwrap();
    assert_eq!(admin.email, "admin@zerno.ru");

    let err = auth
        .require_admin(Some(&manager_token.access_token))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::Forbidden));

    let err = auth.require_admin(None).await.unwrap_err();
    assert!(matches!(err, FeedbackError::Unauthenticated));

    let err = auth.login("admin@zerno.ru", "wrong").await.unwrap_err();
    assert!(matches!(err, FeedbackError::InvalidCredentials));
    let err = auth.login("nobody@zerno.ru", "admin-pass").await.unwrap_err();
    assert!(matches!(err, FeedbackError::InvalidCredentials));
}

#[tokio::test]
async fn test_token_of_deleted_user_is_rejected() {
    let store = InMemoryStore::seeded().await;
    let user = store
        .seed_user("Ирина", "Админова", "admin@zerno.ru", "admin-pass", ADMIN_ROLE_ID)
        .await;
    let auth = auth_service(&store, Arc::new(RecordingEmailTransport::new()));
    let token = auth.login("admin@zerno.ru", "admin-pass").await.unwrap();

    store.delete_user(user.id).await.unwrap();

    let err = auth
        .resolve_user(Some(&token.access_token))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::UserNotFound));
}

// ==================== 密码重置 ====================

#[tokio::test]
async fn test_password_reset_round_trip_is_single_use() {
    let store = InMemoryStore::seeded().await;
    let user = store
        .seed_user("Анна", "Петрова", "anna@zerno.ru", "old-password", STAFF_ROLE_ID)
        .await;
    let mailer = Arc::new(RecordingEmailTransport::new());
    let auth = auth_service(&store, mailer.clone());

    let message = auth.initiate_password_reset("ANNA@zerno.ru").await.unwrap();
    assert_eq!(message, RESET_REQUESTED_MESSAGE);

    let email = mailer
        .wait_for_email(Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(email.to, "anna@zerno.ru");
    let token = token_from_reset_email(&email).unwrap();
    assert_eq!(store.reset_tokens_for(user.id).await.len(), 1);

    let done = auth
        .complete_password_reset(&token, "new-password")
        .await
        .unwrap();
    assert_eq!(done, PASSWORD_UPDATED_MESSAGE);
    assert!(auth.login("anna@zerno.ru", "new-password").await.is_ok());
    assert!(auth.login("anna@zerno.ru", "old-password").await.is_err());

    let err = auth
        .complete_password_reset(&token, "another-password")
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::ResetTokenInvalid));
    assert!(store.reset_tokens_for(user.id).await.is_empty());
}

#[tokio::test]
async fn test_unknown_email_reset_sends_nothing() {
    let store = InMemoryStore::seeded().await;
    let mailer = Arc::new(RecordingEmailTransport::new());
    let auth = auth_service(&store, mailer.clone());

    let message = auth
        .initiate_password_reset("ghost@zerno.ru")
        .await
        .unwrap();
    assert_eq!(message, RESET_REQUESTED_MESSAGE);
    assert!(
        mailer
            .wait_for_email(Duration::from_millis(100))
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_expired_token_is_removed_and_password_kept() {
    let store = InMemoryStore::seeded().await;
    let user = store
        .seed_user("Анна", "Петрова", "anna@zerno.ru", "old-password", STAFF_ROLE_ID)
        .await;
    store
        .replace_for_user(user.id, "ExpiredToken123", Utc::now() - ChronoDuration::minutes(1))
        .await
        .unwrap();
    let auth = auth_service(&store, Arc::new(RecordingEmailTransport::new()));

    let err = auth
        .complete_password_reset("ExpiredToken123", "new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::ResetTokenExpired));
    assert!(store.find_by_token("ExpiredToken123").await.unwrap().is_none());
    assert!(auth.login("anna@zerno.ru", "old-password").await.is_ok());
}

#[tokio::test]
async fn test_new_reset_request_replaces_previous_token() {
    let store = InMemoryStore::seeded().await;
    let user = store
        .seed_user_with_hash("Анна", "Петрова", "anna@zerno.ru", "hash", STAFF_ROLE_ID)
        .await;
    let expires = Utc::now() + ChronoDuration::hours(1);

    store.replace_for_user(user.id, "FirstToken", expires).await.unwrap();
    store.replace_for_user(user.id, "SecondToken", expires).await.unwrap();

    let tokens = store.reset_tokens_for(user.id).await;
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token, "SecondToken");
}

// ==================== 注册审批 ====================

#[tokio::test]
async fn test_approval_creates_exactly_one_user() {
    let store = InMemoryStore::seeded().await;
    let admin = store
        .seed_user_with_hash("Ирина", "Админова", "admin@zerno.ru", "hash", ADMIN_ROLE_ID)
        .await;
    let repo = Arc::new(store.clone());
    let registrations = RegistrationService::new(
        repo.clone(),
        repo.clone(),
        repo,
        &RegistrationConfig::default(),
    );

    let request = registrations
        .submit(SubmitRegistration {
            first_name: "Мария".to_string(),
            second_name: "Иванова".to_string(),
            email: "Maria@Zerno.ru".to_string(),
            password: "secret-pass".to_string(),
            role_id: STAFF_ROLE_ID,
        })
        .await
        .unwrap();
    assert_eq!(request.status, RegistrationStatus::Pending);
    let users_before = store.user_count().await;

    let outcome = registrations
        .resolve(request.id, RegistrationDecision::Approve, admin.id)
        .await
        .unwrap();
    assert_eq!(outcome.request.status, RegistrationStatus::Approved);
    assert_eq!(outcome.request.admin_id, Some(admin.id));
    let user = outcome.user.unwrap();
    assert_eq!(user.email, "maria@zerno.ru");
    assert!(user.active);
    assert_eq!(store.user_count().await, users_before + 1);

    for decision in [RegistrationDecision::Approve, RegistrationDecision::Reject] {
        let err = registrations
            .resolve(request.id, decision, admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidStateTransition { .. }));
    }
    assert_eq!(store.user_count().await, users_before + 1);
}

#[tokio::test]
async fn test_rejected_requests_sort_after_pending() {
    let store = InMemoryStore::seeded().await;
    let repo = Arc::new(store.clone());
    let registrations = RegistrationService::new(
        repo.clone(),
        repo.clone(),
        repo,
        &RegistrationConfig::default(),
    );

    let mut ids = Vec::new();
    for name in ["first", "second"] {
        let request = registrations
            .submit(SubmitRegistration {
                first_name: name.to_string(),
                second_name: "Test".to_string(),
                email: format!("{name}@zerno.ru"),
                password: "secret-pass".to_string(),
                role_id: STAFF_ROLE_ID,
            })
            .await
            .unwrap();
        ids.push(request.id);
    }
    registrations
        .resolve(ids[0], RegistrationDecision::Reject, 1)
        .await
        .unwrap();

    let listed: Vec<i64> = registrations
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(listed, vec![ids[1], ids[0]]);
}

// ==================== 用户分页 ====================

#[tokio::test]
async fn test_user_pages_cover_every_user_once() {
    let store = InMemoryStore::seeded().await;
    let names = ["Яна", "Борис", "Анна", "Виктор", "Анна", "Глеб", "Дарья"];
    for (i, name) in names.iter().enumerate() {
        let role = if i % 2 == 0 { STAFF_ROLE_ID } else { MANAGER_ROLE_ID };
        store
            .seed_user_with_hash(name, "Тестов", &format!("user{i}@zerno.ru"), "hash", role)
            .await;
    }
    let repo = Arc::new(store.clone());
    let users = UserService::new(repo.clone(), repo);

    for sort_by in [UserSortField::Id, UserSortField::FirstName, UserSortField::RoleId] {
        for ascending in [true, false] {
            for limit in [1, 2, 3, 50] {
                let mut seen = Vec::new();
                let mut cursor = None;
                loop {
                    let query = UserListQuery {
                        limit,
                        cursor,
                        sort_by,
                        ascending,
                        ..Default::default()
                    };
                    let page = users.list_users(&query).await.unwrap();
                    seen.extend(page.items.iter().map(|u| u.id));
                    match page.next_cursor {
                        Some(next) => cursor = Some(next),
                        None => break,
                    }
                }

                let unique: HashSet<i64> = seen.iter().copied().collect();
                assert_eq!(unique.len(), seen.len(), "{sort_by} limit {limit}");
                assert_eq!(unique.len(), names.len(), "{sort_by} limit {limit}");
            }
        }
    }
}

#[tokio::test]
async fn test_user_list_filters_by_role() {
    let store = InMemoryStore::seeded().await;
    for i in 0..4 {
        let role = if i < 3 { STAFF_ROLE_ID } else { ADMIN_ROLE_ID };
        store
            .seed_user_with_hash("Имя", "Фамилия", &format!("u{i}@zerno.ru"), "hash", role)
            .await;
    }
    let repo = Arc::new(store.clone());
    let users = UserService::new(repo.clone(), repo);

    let query = UserListQuery::parse(Some(10), None, Some(STAFF_ROLE_ID), None, Some("email"), None)
        .unwrap();
    let page = users.list_users(&query).await.unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.items.iter().all(|u| u.role_id == STAFF_ROLE_ID));
    assert!(page.next_cursor.is_none());

    let err = UserListQuery::parse(None, None, None, None, Some("password"), None).unwrap_err();
    assert!(matches!(err, FeedbackError::InvalidSortField(_)));
}
