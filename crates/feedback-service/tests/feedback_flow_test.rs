//! 反馈流程集成测试
//!
//! 使用内存仓储与录制传输验证提交、推送扇出、评论分页与统计（无需外部依赖）

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use feedback_core::models::{NewFeedback, NewRating, NewTag, NewWaiterScore, ScoreFilter, User};
use feedback_core::notification::{
    ChatDestinationStore, DeliveryStatus, FeedbackFormatter, NotificationDispatcher,
};
use feedback_core::pagination::CommentQuery;
use feedback_core::repository::{
    FeedbackRepositoryTrait, TaxonomyRepositoryTrait, WaiterScoreRepositoryTrait,
};
use feedback_core::service::{FeedbackService, StatsService};
use feedback_core::testing::{
    InMemoryDestinationStore, InMemoryStore, RecordingTransport, STAFF_ROLE_ID,
};
use feedback_core::FeedbackError;

// ==================== 测试夹具 ====================

struct Fixture {
    store: InMemoryStore,
    transport: Arc<RecordingTransport>,
    destinations: Arc<InMemoryDestinationStore>,
    service: FeedbackService,
    waiter: User,
    positive_tag: i64,
    negative_tag: i64,
}

async fn fixture(chat_ids: &[&str], transport: RecordingTransport) -> Fixture {
    let store = InMemoryStore::seeded().await;
    let waiter = store
        .seed_user_with_hash("Анна", "Петрова", "anna@zerno.ru", "hash", STAFF_ROLE_ID)
        .await;
    let positive_tag = store
        .create_tag(&NewTag {
            name: "вежливость".to_string(),
            category_id: 1,
        })
        .await
        .unwrap()
        .id;
    let negative_tag = store
        .create_tag(&NewTag {
            name: "долго".to_string(),
            category_id: 3,
        })
        .await
        .unwrap()
        .id;

    let transport = Arc::new(transport);
    let destinations = Arc::new(InMemoryDestinationStore::with_chat_ids(chat_ids));
    let repo = Arc::new(store.clone());
    let dispatcher = NotificationDispatcher::new(
        destinations.clone(),
        transport.clone(),
        repo.clone(),
        repo.clone(),
        repo.clone(),
    )
    .with_delivery_timeout(Duration::from_millis(500))
    .with_formatter(FeedbackFormatter::utc());

    let service = FeedbackService::new(repo.clone(), repo.clone(), repo, Arc::new(dispatcher));

    Fixture {
        store,
        transport,
        destinations,
        service,
        waiter,
        positive_tag,
        negative_tag,
    }
}

fn score(waiter_id: i64, score: i32, tag_id: i64, comment: Option<&str>) -> NewFeedback {
    NewFeedback {
        contact: None,
        waiter_score: Some(NewWaiterScore {
            waiter_id,
            score,
            comment: comment.map(str::to_string),
            tag_id,
            category_id: None,
        }),
        ratings: vec![],
    }
}

// ==================== 提交与推送 ====================

#[tokio::test]
async fn test_create_then_get_returns_all_children() {
    let fx = fixture(&[], RecordingTransport::new()).await;
    let kitchen = fx.store.create_feedback_type("Кухня").await.unwrap();
    let service_type = fx.store.create_feedback_type("Сервис").await.unwrap();

    let mut input = score(fx.waiter.id, 5, fx.positive_tag, Some("Отлично"));
    input.contact = Some(" +7 (999) 123-45-67 ".to_string());
    input.ratings = vec![
        NewRating {
            rating: 5,
            feedback_type_id: kitchen.id,
        },
        NewRating {
            rating: 4,
            feedback_type_id: service_type.id,
        },
    ];

    let created = fx.service.create_feedback(input).await.unwrap();
    let fetched = fx.service.get_feedback(created.id).await.unwrap();

    assert_eq!(fetched.ratings.len(), 2);
    assert_eq!(fetched.contact.unwrap().phone, "+7 (999) 123-45-67");
    let waiter_score = fetched.waiter_score.unwrap();
    assert_eq!(waiter_score.category_id, 1);
    assert_eq!(waiter_score.feedback_id, created.id);
}

#[tokio::test]
async fn test_delete_removes_feedback_with_children() {
    let fx = fixture(&[], RecordingTransport::new()).await;
    let kitchen = fx.store.create_feedback_type("Кухня").await.unwrap();

    let mut input = score(fx.waiter.id, 4, fx.positive_tag, Some("Хорошо"));
    input.contact = Some("+7 999 000-11-22".to_string());
    input.ratings = vec![NewRating {
        rating: 4,
        feedback_type_id: kitchen.id,
    }];
    let created = fx.service.create_feedback(input).await.unwrap();
    assert_eq!(
        fx.store
            .count_scores(fx.waiter.id, ScoreFilter::All)
            .await
            .unwrap(),
        1
    );

    fx.service.delete_feedback(created.id).await.unwrap();

    let err = fx.service.get_feedback(created.id).await.unwrap_err();
    assert!(matches!(err, FeedbackError::NotFound { .. }));
    assert_eq!(
        fx.store
            .count_scores(fx.waiter.id, ScoreFilter::All)
            .await
            .unwrap(),
        0
    );
    let comments = fx
        .service
        .list_comments(&CommentQuery::default())
        .await
        .unwrap();
    assert!(comments.items.is_empty());

    // 再次删除返回 NotFound
    let err = fx.service.delete_feedback(created.id).await.unwrap_err();
    assert!(matches!(err, FeedbackError::NotFound { .. }));
}

#[tokio::test]
async fn test_create_returns_before_any_delivery() {
    let delay = Duration::from_millis(300);
    let transport = RecordingTransport::new()
        .delayed_for("-100100", delay)
        .delayed_for("-100200", delay);
    let fx = fixture(&["-100100", "-100200"], transport).await;

    fx.service
        .create_feedback(score(fx.waiter.id, 5, fx.positive_tag, None))
        .await
        .unwrap();

    // 所有会话都在延迟中，提交已经返回
    assert_eq!(fx.transport.attempts().await, 0);
    assert!(fx.transport.delivered().await.is_empty());

    assert!(
        fx.transport
            .wait_for_attempts(2, Duration::from_secs(2))
            .await
    );
    assert_eq!(fx.transport.delivered().await.len(), 2);
}

#[tokio::test]
async fn test_fanout_isolates_failing_destination() {
    let transport = RecordingTransport::new()
        .failing_for("-100200")
        .delayed_for("@slow", Duration::from_millis(50));
    let fx = fixture(&["-100100", "-100200", "@slow"], transport).await;

    fx.service
        .create_feedback(score(fx.waiter.id, 5, fx.positive_tag, None))
        .await
        .unwrap();

    assert!(
        fx.transport
            .wait_for_attempts(3, Duration::from_secs(2))
            .await
    );
    let delivered: HashSet<String> = fx
        .transport
        .delivered()
        .await
        .into_iter()
        .map(|(chat_id, _)| chat_id)
        .collect();
    assert_eq!(
        delivered,
        HashSet::from(["-100100".to_string(), "@slow".to_string()])
    );

    let text = &fx.transport.delivered().await[0].1;
    assert!(text.contains("Анна Петрова"));
}

#[tokio::test]
async fn test_dispatch_report_and_notified_flag() {
    let transport = RecordingTransport::new().failing_for("-2");
    let fx = fixture(&["-1", "-2"], transport).await;
    let repo = Arc::new(fx.store.clone());
    let dispatcher = NotificationDispatcher::new(
        fx.destinations.clone(),
        fx.transport.clone(),
        repo.clone(),
        repo.clone(),
        repo,
    );

    let feedback = fx
        .store
        .create_feedback(&feedback_core::models::FeedbackDraft {
            created_at: chrono::Utc::now(),
            contact: None,
            waiter_score: None,
            ratings: vec![],
        })
        .await
        .unwrap();

    let report = dispatcher.dispatch(&feedback).await;
    assert_eq!(report.delivered_count(), 1);
    assert_eq!(report.failed_count(), 1);
    assert!(report
        .outcomes
        .iter()
        .any(|o| o.chat_id == "-2" && matches!(o.status, DeliveryStatus::Failed(_))));

    let stored = fx.store.get_feedback(feedback.id).await.unwrap().unwrap();
    assert!(stored.is_notified);
}

#[tokio::test]
async fn test_slow_destination_times_out_independently() {
    let transport = RecordingTransport::new().delayed_for("-9", Duration::from_secs(5));
    let fx = fixture(&["-1", "-9"], transport).await;
    let repo = Arc::new(fx.store.clone());
    let dispatcher = NotificationDispatcher::new(
        fx.destinations.clone(),
        fx.transport.clone(),
        repo.clone(),
        repo.clone(),
        repo,
    )
    .with_delivery_timeout(Duration::from_millis(100));

    let feedback = fx
        .service
        .create_feedback(score(fx.waiter.id, 2, fx.negative_tag, None))
        .await
        .unwrap();
    let report = dispatcher.dispatch(&feedback).await;

    let slow = report.outcomes.iter().find(|o| o.chat_id == "-9").unwrap();
    assert_eq!(slow.status, DeliveryStatus::TimedOut);
    assert!(report.any_delivered());
}

#[tokio::test]
async fn test_removed_destination_receives_nothing() {
    let fx = fixture(&[], RecordingTransport::new()).await;
    let kept = fx.destinations.add("-500").await.unwrap();
    let removed = fx.destinations.add("@gone").await.unwrap();
    fx.destinations.remove(&removed.id).await.unwrap();

    fx.service
        .create_feedback(score(fx.waiter.id, 4, fx.positive_tag, None))
        .await
        .unwrap();

    assert!(
        fx.transport
            .wait_for_attempts(1, Duration::from_secs(2))
            .await
    );
    let delivered = fx.transport.delivered().await;
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, kept.chat_id);
}

#[tokio::test]
async fn test_tag_outside_category_is_rejected() {
    let fx = fixture(&[], RecordingTransport::new()).await;

    // 评分 5 推导为正面分类，负面标签不匹配
    let err = fx
        .service
        .create_feedback(score(fx.waiter.id, 5, fx.negative_tag, None))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedbackError::Validation(_)));
}

// ==================== 评论分页 ====================

#[tokio::test]
async fn test_comment_pages_are_exhaustive_and_disjoint() {
    let fx = fixture(&[], RecordingTransport::new()).await;
    let mut expected = HashSet::new();
    for i in 0..11 {
        // 未留评论的评分同样计入
        let comment = if i % 4 == 0 { None } else { Some(format!("комментарий {i}")) };
        let created = fx
            .service
            .create_feedback(score(fx.waiter.id, 5, fx.positive_tag, comment.as_deref()))
            .await
            .unwrap();
        expected.insert(created.id);
    }
    // 只有评分项、没有员工评分的反馈不在列表中
    let kitchen = fx.store.create_feedback_type("Кухня").await.unwrap();
    fx.service
        .create_feedback(NewFeedback {
            contact: None,
            waiter_score: None,
            ratings: vec![NewRating {
                rating: 3,
                feedback_type_id: kitchen.id,
            }],
        })
        .await
        .unwrap();

    for ascending in [true, false] {
        for limit in [1, 3, 4, 100] {
            let mut seen = Vec::new();
            let mut cursor = None;
            loop {
                let page = fx
                    .service
                    .list_comments(&CommentQuery {
                        cursor,
                        limit,
                        ascending,
                        ..Default::default()
                    })
                    .await
                    .unwrap();
                seen.extend(page.items.iter().map(|c| c.feedback_id));
                match page.next_cursor {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }

            let unique: HashSet<i64> = seen.iter().copied().collect();
            assert_eq!(unique.len(), seen.len(), "limit {limit} returned duplicates");
            assert_eq!(unique, expected, "limit {limit} missed scores");

            let mut sorted = seen.clone();
            sorted.sort();
            if !ascending {
                sorted.reverse();
            }
            assert_eq!(seen, sorted);
        }
    }
}

#[tokio::test]
async fn test_scores_without_comment_are_listed() {
    let fx = fixture(&[], RecordingTransport::new()).await;
    let silent = fx
        .service
        .create_feedback(score(fx.waiter.id, 4, fx.positive_tag, None))
        .await
        .unwrap();
    let commented = fx
        .service
        .create_feedback(score(fx.waiter.id, 5, fx.positive_tag, Some("ok")))
        .await
        .unwrap();

    let page = fx
        .service
        .list_comments(&CommentQuery {
            waiter_id: Some(fx.waiter.id),
            ascending: true,
            ..Default::default()
        })
        .await
        .unwrap();

    let ids: Vec<i64> = page.items.iter().map(|c| c.feedback_id).collect();
    assert_eq!(ids, vec![silent.id, commented.id]);
    assert_eq!(page.items[0].comment, None);
    assert_eq!(page.items[0].score, 4);
    assert_eq!(page.items[1].comment.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_deleting_cursor_row_keeps_remaining_pages() {
    let fx = fixture(&[], RecordingTransport::new()).await;
    let mut ids = Vec::new();
    for i in 0..6 {
        let created = fx
            .service
            .create_feedback(score(
                fx.waiter.id,
                5,
                fx.positive_tag,
                Some(&format!("комментарий {i}")),
            ))
            .await
            .unwrap();
        ids.push(created.id);
    }

    let query = CommentQuery {
        limit: 2,
        ascending: true,
        ..Default::default()
    };
    let first = fx.service.list_comments(&query).await.unwrap();
    let cursor = first.next_cursor.unwrap();
    assert_eq!(cursor, ids[1]);

    fx.service.delete_feedback(cursor).await.unwrap();

    let mut seen: Vec<i64> = first.items.iter().map(|c| c.feedback_id).collect();
    let mut next = Some(cursor);
    while let Some(cursor) = next {
        let page = fx
            .service
            .list_comments(&CommentQuery {
                cursor: Some(cursor),
                ..query.clone()
            })
            .await
            .unwrap();
        seen.extend(page.items.iter().map(|c| c.feedback_id));
        next = page.next_cursor;
    }

    assert_eq!(seen, ids);
}

#[tokio::test]
async fn test_comment_filters_by_waiter() {
    let fx = fixture(&[], RecordingTransport::new()).await;
    let other = fx
        .store
        .seed_user_with_hash("Олег", "Смирнов", "oleg@zerno.ru", "hash", STAFF_ROLE_ID)
        .await;

    fx.service
        .create_feedback(score(fx.waiter.id, 5, fx.positive_tag, Some("спасибо")))
        .await
        .unwrap();
    fx.service
        .create_feedback(score(other.id, 5, fx.positive_tag, Some("хорошо")))
        .await
        .unwrap();

    let page = fx
        .service
        .list_comments(&CommentQuery {
            waiter_id: Some(other.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].waiter_id, other.id);
    assert!(page.next_cursor.is_none());
}

// ==================== 统计 ====================

#[tokio::test]
async fn test_csat_and_tag_stats() {
    let fx = fixture(&[], RecordingTransport::new()).await;
    for (value, tag) in [
        (5, fx.positive_tag),
        (4, fx.positive_tag),
        (5, fx.positive_tag),
        (1, fx.negative_tag),
    ] {
        fx.service
            .create_feedback(score(fx.waiter.id, value, tag, None))
            .await
            .unwrap();
    }

    let repo = Arc::new(fx.store.clone());
    let stats = StatsService::new(repo.clone(), repo);

    let report = stats.csat(fx.waiter.id).await.unwrap();
    assert_eq!(report.total_feedbacks, 4);
    assert_eq!(report.positive_feedbacks, 3);
    assert_eq!(report.csat, 75.0);

    let empty = stats.csat(9999).await.unwrap();
    assert_eq!(empty.csat, 0.0);

    let tags = stats.tag_stats(fx.waiter.id).await.unwrap();
    assert_eq!(tags["положительный"]["вежливость"], 3);
    assert_eq!(tags["отрицательный"]["долго"], 1);
    assert!(tags["нейтральный"].is_empty());
}
