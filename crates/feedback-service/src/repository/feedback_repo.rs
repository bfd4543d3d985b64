//! 反馈聚合仓储
//!
//! 写入在单事务内完成；读取时按 id 批量装载子实体，避免逐条查询。

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::traits::{FeedbackRepositoryTrait, WaiterScoreRepositoryTrait};
use crate::error::Result;
use crate::models::{
    Contact, Feedback, FeedbackComment, FeedbackDraft, FeedbackRow, Rating, ScoreFilter,
    WaiterScore,
};
use crate::pagination::CommentQuery;

const WAITER_SCORE_COLUMNS: &str =
    "id, waiter_id, score, comment, tag_id, category_id, feedback_id";

/// 反馈仓储
pub struct FeedbackRepository {
    pool: PgPool,
}

impl FeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 为一批反馈根记录装载子实体，保持输入顺序
    async fn hydrate(&self, rows: Vec<FeedbackRow>) -> Result<Vec<Feedback>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT id, phone, feedback_id FROM contacts WHERE feedback_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let scores = sqlx::query_as::<_, WaiterScore>(&format!(
            "SELECT {WAITER_SCORE_COLUMNS} FROM waiter_scores WHERE feedback_id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let ratings = sqlx::query_as::<_, Rating>(
            r#"
            SELECT id, rating, feedback_type_id, feedback_id
            FROM ratings
            WHERE feedback_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut contacts: HashMap<i64, Contact> =
            contacts.into_iter().map(|c| (c.feedback_id, c)).collect();
        let mut scores: HashMap<i64, WaiterScore> =
            scores.into_iter().map(|s| (s.feedback_id, s)).collect();
        let mut grouped: HashMap<i64, Vec<Rating>> = HashMap::new();
        for rating in ratings {
            grouped.entry(rating.feedback_id).or_default().push(rating);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                row.into_aggregate(
                    contacts.remove(&id),
                    scores.remove(&id),
                    grouped.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn insert_children(
        conn: &mut PgConnection,
        feedback_id: i64,
        draft: &FeedbackDraft,
    ) -> Result<(Option<Contact>, Option<WaiterScore>, Vec<Rating>)> {
        let contact = match &draft.contact {
            Some(phone) => Some(
                sqlx::query_as::<_, Contact>(
                    r#"
                    INSERT INTO contacts (phone, feedback_id)
                    VALUES ($1, $2)
                    RETURNING id, phone, feedback_id
                    "#,
                )
                .bind(phone)
                .bind(feedback_id)
                .fetch_one(&mut *conn)
                .await?,
            ),
            None => None,
        };

        let waiter_score = match &draft.waiter_score {
            Some(score) => Some(
                sqlx::query_as::<_, WaiterScore>(&format!(
                    r#"
                    INSERT INTO waiter_scores (waiter_id, score, comment, tag_id, category_id, feedback_id)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING {WAITER_SCORE_COLUMNS}
                    "#
                ))
                .bind(score.waiter_id)
                .bind(score.score)
                .bind(&score.comment)
                .bind(score.tag_id)
                .bind(score.category_id)
                .bind(feedback_id)
                .fetch_one(&mut *conn)
                .await?,
            ),
            None => None,
        };

        let mut ratings = Vec::with_capacity(draft.ratings.len());
        for rating in &draft.ratings {
            let inserted = sqlx::query_as::<_, Rating>(
                r#"
                INSERT INTO ratings (rating, feedback_type_id, feedback_id)
                VALUES ($1, $2, $3)
                RETURNING id, rating, feedback_type_id, feedback_id
                "#,
            )
            .bind(rating.rating)
            .bind(rating.feedback_type_id)
            .bind(feedback_id)
            .fetch_one(&mut *conn)
            .await?;
            ratings.push(inserted);
        }

        Ok((contact, waiter_score, ratings))
    }
}

/// 评论分页查询：列出每条员工评分（评论可为空），按反馈 id 即创建顺序排列
///
/// 游标直接与 id 比较，不依赖游标所在行仍然存在。
fn build_comment_query(query: &CommentQuery) -> QueryBuilder<'_, Postgres> {
    let (cmp, dir) = if query.ascending {
        (">", "ASC")
    } else {
        ("<", "DESC")
    };

    let mut qb = QueryBuilder::new(
        r#"SELECT f.id AS feedback_id, ws.waiter_id, ws.score, ws.comment, f.created_at
        FROM waiter_scores ws
        JOIN feedbacks f ON f.id = ws.feedback_id
        WHERE TRUE"#,
    );

    if let Some(waiter_id) = query.waiter_id {
        qb.push(" AND ws.waiter_id = ").push_bind(waiter_id);
    }
    if let Some(starts_at) = query.starts_at() {
        qb.push(" AND f.created_at >= ").push_bind(starts_at);
    }
    if let Some(ends_before) = query.ends_before() {
        qb.push(" AND f.created_at < ").push_bind(ends_before);
    }
    if let Some(cursor) = query.cursor {
        qb.push(format!(" AND f.id {cmp} ")).push_bind(cursor);
    }

    qb.push(format!(" ORDER BY f.id {dir} LIMIT "))
        .push_bind(query.limit);

    qb
}

#[async_trait]
impl FeedbackRepositoryTrait for FeedbackRepository {
    async fn create_feedback(&self, draft: &FeedbackDraft) -> Result<Feedback> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, FeedbackRow>(
            r#"
            INSERT INTO feedbacks (created_at, is_notified)
            VALUES ($1, FALSE)
            RETURNING id, created_at, is_notified
            "#,
        )
        .bind(draft.created_at)
        .fetch_one(&mut *tx)
        .await?;

        let (contact, waiter_score, ratings) =
            Self::insert_children(&mut tx, row.id, draft).await?;

        tx.commit().await?;

        Ok(row.into_aggregate(contact, waiter_score, ratings))
    }

    async fn get_feedback(&self, id: i64) -> Result<Option<Feedback>> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            "SELECT id, created_at, is_notified FROM feedbacks WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_feedbacks(&self, cursor: Option<i64>, limit: i64) -> Result<Vec<Feedback>> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT id, created_at, is_notified
            FROM feedbacks
            WHERE ($1::BIGINT IS NULL OR id < $1)
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(cursor)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn delete_feedback(&self, id: i64) -> Result<bool> {
        // 子表通过 ON DELETE CASCADE 一并删除
        let result = sqlx::query("DELETE FROM feedbacks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(&self, query: &CommentQuery) -> Result<Vec<FeedbackComment>> {
        let comments = build_comment_query(query)
            .build_query_as::<FeedbackComment>()
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }

    async fn mark_notified(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE feedbacks SET is_notified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl WaiterScoreRepositoryTrait for FeedbackRepository {
    async fn count_scores(&self, waiter_id: i64, filter: ScoreFilter) -> Result<i64> {
        let count: i64 = match filter {
            ScoreFilter::All => {
                sqlx::query_scalar("SELECT COUNT(*) FROM waiter_scores WHERE waiter_id = $1")
                    .bind(waiter_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            ScoreFilter::Category(category_id) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM waiter_scores WHERE waiter_id = $1 AND category_id = $2",
                )
                .bind(waiter_id)
                .bind(category_id)
                .fetch_one(&self.pool)
                .await?
            }
            ScoreFilter::Tag(tag_id) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM waiter_scores WHERE waiter_id = $1 AND tag_id = $2",
                )
                .bind(waiter_id)
                .bind(tag_id)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(count)
    }
}
