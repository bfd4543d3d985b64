//! 推送消息格式化
//!
//! 格式化是纯函数：引用数据（员工、分类、标签、反馈类型名称）由调度器预先解析，
//! 这里只负责拼装文本。

use chrono::{FixedOffset, Offset, Utc};

use crate::models::Feedback;

const NOT_SPECIFIED: &str = "Не указан";
const NO_COMMENT: &str = "Не оставлен";

/// 格式化所需的引用数据
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageContext {
    pub waiter_first_name: Option<String>,
    pub waiter_second_name: Option<String>,
    pub category_name: Option<String>,
    pub tag_name: Option<String>,
    /// (反馈类型名称, 评分)，顺序与反馈中的 ratings 一致
    pub ratings: Vec<(String, i32)>,
}

/// 反馈消息格式化器
#[derive(Debug, Clone, Copy)]
pub struct FeedbackFormatter {
    offset: FixedOffset,
}

impl Default for FeedbackFormatter {
    fn default() -> Self {
        Self::utc()
    }
}

impl FeedbackFormatter {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// 按分钟偏移构造；越界时退回 UTC
    pub fn with_offset_minutes(minutes: i32) -> Self {
        FixedOffset::east_opt(minutes.saturating_mul(60))
            .map(Self::new)
            .unwrap_or_else(Self::utc)
    }

    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn format(&self, feedback: &Feedback, ctx: &MessageContext) -> String {
        let created_at = feedback
            .created_at
            .with_timezone(&self.offset)
            .format("%Y-%m-%d %H:%M");

        let first_name = ctx.waiter_first_name.as_deref().unwrap_or(NOT_SPECIFIED);
        let second_name = ctx.waiter_second_name.as_deref().unwrap_or("");
        let phone = feedback
            .contact
            .as_ref()
            .map(|c| c.phone.as_str())
            .unwrap_or(NOT_SPECIFIED);
        let score = feedback
            .waiter_score
            .as_ref()
            .map(|s| s.score.to_string())
            .unwrap_or_else(|| NOT_SPECIFIED.to_string());
        let category = ctx.category_name.as_deref().unwrap_or(NOT_SPECIFIED);
        let tag = ctx.tag_name.as_deref().unwrap_or(NOT_SPECIFIED);
        let comment = feedback
            .waiter_score
            .as_ref()
            .and_then(|s| s.comment.as_deref())
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(NO_COMMENT);

        let mut message = format!(
            "📝 Отзыв №{id}\n\
             📅 Время отправки: {created_at}\n\n\
             🤵 Обслуживал: {first_name} {second_name}\n\n\
             📞 Контакт: {phone}\n\n\
             ⭐ Оценка: {score}\n\n\
             🏷 {category} тег: {tag}\n\n",
            id = feedback.id,
        );

        if !ctx.ratings.is_empty() {
            let block = ctx
                .ratings
                .iter()
                .map(|(name, rating)| format!("Категория: {name},\nОценка: {rating}"))
                .collect::<Vec<_>>()
                .join("\n\n");
            message.push_str("📊 Оценки:\n");
            message.push_str(&block);
            message.push_str("\n\n");
        }

        message.push_str("💬 Комментарий:\n");
        message.push_str(comment);
        message.push('\n');
        message
    }
}
