//! 反馈写入与查询服务
//!
//! 提交流程：校验 -> 单事务写入聚合 -> 交给通知器后台推送 -> 立即返回。

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use hrm_shared::observability::metrics;
use tracing::{info, instrument};

use crate::error::{FeedbackError, Result};
use crate::models::{
    CategoryKind, Feedback, FeedbackComment, FeedbackDraft, NewFeedback, NewRating,
    NewWaiterScore, WaiterScoreDraft,
};
use crate::notification::FeedbackNotifier;
use crate::pagination::{CommentQuery, CursorPage, clamp_limit};
use crate::repository::{FeedbackRepositoryTrait, TaxonomyRepositoryTrait, UserRepositoryTrait};

const MIN_SCORE: i32 = 1;
const MAX_SCORE: i32 = 5;
const MIN_PHONE_DIGITS: usize = 5;
const MAX_PHONE_LEN: usize = 32;
const MAX_COMMENT_LEN: usize = 2000;

fn check_score(field: &str, value: i32) -> Result<()> {
    if (MIN_SCORE..=MAX_SCORE).contains(&value) {
        Ok(())
    } else {
        Err(FeedbackError::Validation(format!(
            "{field} 必须在 {MIN_SCORE}-{MAX_SCORE} 之间，实际为 {value}"
        )))
    }
}

/// 规范化电话：空串视为未填写
fn normalize_phone(phone: Option<&str>) -> Result<Option<String>> {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !allowed || digits < MIN_PHONE_DIGITS || phone.len() > MAX_PHONE_LEN {
        return Err(FeedbackError::Validation(format!("无效的电话号码: {phone}")));
    }
    Ok(Some(phone.to_string()))
}

fn normalize_comment(comment: Option<&str>) -> Result<Option<String>> {
    let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(FeedbackError::Validation(format!(
            "评论长度不能超过 {MAX_COMMENT_LEN} 个字符"
        )));
    }
    Ok(Some(comment.to_string()))
}

pub struct FeedbackService {
    feedbacks: Arc<dyn FeedbackRepositoryTrait>,
    taxonomy: Arc<dyn TaxonomyRepositoryTrait>,
    users: Arc<dyn UserRepositoryTrait>,
    notifier: Arc<dyn FeedbackNotifier>,
}

impl FeedbackService {
    pub fn new(
        feedbacks: Arc<dyn FeedbackRepositoryTrait>,
        taxonomy: Arc<dyn TaxonomyRepositoryTrait>,
        users: Arc<dyn UserRepositoryTrait>,
        notifier: Arc<dyn FeedbackNotifier>,
    ) -> Self {
        Self {
            feedbacks,
            taxonomy,
            users,
            notifier,
        }
    }

    async fn validate_ratings(&self, ratings: &[NewRating]) -> Result<()> {
        let mut seen = HashSet::with_capacity(ratings.len());
        for rating in ratings {
            check_score("rating", rating.rating)?;
            if !seen.insert(rating.feedback_type_id) {
                return Err(FeedbackError::Validation(format!(
                    "反馈类型 {} 重复评分",
                    rating.feedback_type_id
                )));
            }
            if self
                .taxonomy
                .get_feedback_type(rating.feedback_type_id)
                .await?
                .is_none()
            {
                return Err(FeedbackError::Validation(format!(
                    "反馈类型不存在: {}",
                    rating.feedback_type_id
                )));
            }
        }
        Ok(())
    }

    /// 校验员工评分并补全分类
    async fn prepare_waiter_score(&self, score: &NewWaiterScore) -> Result<WaiterScoreDraft> {
        check_score("score", score.score)?;

        if self.users.get_user(score.waiter_id).await?.is_none() {
            return Err(FeedbackError::Validation(format!(
                "员工不存在: {}",
                score.waiter_id
            )));
        }

        let category = match score.category_id {
            Some(id) => self.taxonomy.get_category(id).await?,
            None => {
                self.taxonomy
                    .find_category_by_kind(CategoryKind::from_score(score.score))
                    .await?
            }
        }
        .ok_or_else(|| FeedbackError::Validation("评价分类不存在".to_string()))?;

        let tag = self
            .taxonomy
            .get_tag(score.tag_id)
            .await?
            .ok_or_else(|| FeedbackError::Validation(format!("标签不存在: {}", score.tag_id)))?;
        if tag.category_id != category.id {
            return Err(FeedbackError::Validation(format!(
                "标签 {} 不属于分类 {}",
                tag.id, category.id
            )));
        }

        Ok(WaiterScoreDraft {
            waiter_id: score.waiter_id,
            score: score.score,
            comment: normalize_comment(score.comment.as_deref())?,
            tag_id: tag.id,
            category_id: category.id,
        })
    }

    /// 提交反馈
    ///
    /// 提交成功后推送在后台进行，返回不等待投递结果。
    #[instrument(skip(self, input), fields(ratings = input.ratings.len()))]
    pub async fn create_feedback(&self, input: NewFeedback) -> Result<Feedback> {
        if input.waiter_score.is_none() && input.ratings.is_empty() {
            return Err(FeedbackError::Validation(
                "反馈至少需要包含一项评分".to_string(),
            ));
        }

        self.validate_ratings(&input.ratings).await?;
        let contact = normalize_phone(input.contact.as_deref())?;
        let waiter_score = match &input.waiter_score {
            Some(score) => Some(self.prepare_waiter_score(score).await?),
            None => None,
        };

        let draft = FeedbackDraft {
            created_at: Utc::now(),
            contact,
            waiter_score,
            ratings: input.ratings,
        };
        let feedback = self.feedbacks.create_feedback(&draft).await?;

        metrics::record_feedback_created(feedback.waiter_score.is_some(), feedback.ratings.len());
        info!(feedback_id = feedback.id, "反馈已保存");

        self.notifier.notify(feedback.clone());
        Ok(feedback)
    }

    pub async fn get_feedback(&self, id: i64) -> Result<Feedback> {
        self.feedbacks
            .get_feedback(id)
            .await?
            .ok_or_else(|| FeedbackError::not_found("feedback", id))
    }

    #[instrument(skip(self))]
    pub async fn delete_feedback(&self, id: i64) -> Result<()> {
        if !self.feedbacks.delete_feedback(id).await? {
            return Err(FeedbackError::not_found("feedback", id));
        }
        info!(feedback_id = id, "反馈已删除");
        Ok(())
    }

    /// 按 id 倒序分页
    pub async fn list_feedbacks(
        &self,
        cursor: Option<i64>,
        limit: Option<i64>,
    ) -> Result<CursorPage<Feedback>> {
        let limit = clamp_limit(limit);
        let rows = self.feedbacks.list_feedbacks(cursor, limit).await?;
        Ok(CursorPage::from_rows(rows, limit, |f| f.id))
    }

    pub async fn list_comments(&self, query: &CommentQuery) -> Result<CursorPage<FeedbackComment>> {
        query.validate()?;
        let rows = self.feedbacks.list_comments(query).await?;
        Ok(CursorPage::from_rows(rows, query.limit, |c| c.feedback_id))
    }
}
