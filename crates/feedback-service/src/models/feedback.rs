//! 反馈聚合模型
//!
//! Feedback 是聚合根，独占 Contact、WaiterScore 与 Ratings，删除时级联。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 反馈聚合根（含子实体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub is_notified: bool,
    pub contact: Option<Contact>,
    pub waiter_score: Option<WaiterScore>,
    pub ratings: Vec<Rating>,
}

/// 反馈根记录（不含子实体）
#[derive(Debug, Clone, FromRow)]
pub struct FeedbackRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub is_notified: bool,
}

impl FeedbackRow {
    pub fn into_aggregate(
        self,
        contact: Option<Contact>,
        waiter_score: Option<WaiterScore>,
        ratings: Vec<Rating>,
    ) -> Feedback {
        Feedback {
            id: self.id,
            created_at: self.created_at,
            is_notified: self.is_notified,
            contact,
            waiter_score,
            ratings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: i64,
    pub phone: String,
    pub feedback_id: i64,
}

/// 针对某位员工的结构化评价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WaiterScore {
    pub id: i64,
    pub waiter_id: i64,
    pub score: i32,
    pub comment: Option<String>,
    pub tag_id: i64,
    pub category_id: i64,
    pub feedback_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub id: i64,
    pub rating: i32,
    pub feedback_type_id: i64,
    pub feedback_id: i64,
}

/// 客户提交的反馈
///
/// `category_id` 缺省时按评分推导。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewFeedback {
    pub contact: Option<String>,
    pub waiter_score: Option<NewWaiterScore>,
    #[serde(default)]
    pub ratings: Vec<NewRating>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWaiterScore {
    pub waiter_id: i64,
    pub score: i32,
    pub comment: Option<String>,
    pub tag_id: i64,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewRating {
    pub rating: i32,
    pub feedback_type_id: i64,
}

/// 校验并补全后交给仓储写入的草稿
#[derive(Debug, Clone)]
pub struct FeedbackDraft {
    pub created_at: DateTime<Utc>,
    pub contact: Option<String>,
    pub waiter_score: Option<WaiterScoreDraft>,
    pub ratings: Vec<NewRating>,
}

#[derive(Debug, Clone)]
pub struct WaiterScoreDraft {
    pub waiter_id: i64,
    pub score: i32,
    pub comment: Option<String>,
    pub tag_id: i64,
    pub category_id: i64,
}

/// 评论列表中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FeedbackComment {
    pub feedback_id: i64,
    pub waiter_id: i64,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 员工评分计数条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFilter {
    All,
    Category(i64),
    Tag(i64),
}
