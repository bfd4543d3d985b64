//! 反馈推送调度
//!
//! 每条新反馈格式化一次，然后并行投递到当前全部目标会话：
//!
//! - 每个会话独立计时，超时或失败只影响自身
//! - 不重试，每次尝试都记录日志与指标
//! - 至少一个会话投递成功后标记 `is_notified`

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use hrm_shared::config::TelegramConfig;
use hrm_shared::observability::metrics;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use super::destinations::ChatDestinationStore;
use super::formatter::{FeedbackFormatter, MessageContext};
use super::transport::MessageTransport;
use crate::models::Feedback;
use crate::repository::{FeedbackRepositoryTrait, TaxonomyRepositoryTrait, UserRepositoryTrait};

/// 新反馈通知接口
///
/// 由反馈写入方在提交后调用，调用立即返回。
pub trait FeedbackNotifier: Send + Sync {
    fn notify(&self, feedback: Feedback);
}

/// 单个会话的投递结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed(String),
    TimedOut,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed(_) => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub chat_id: String,
    pub status: DeliveryStatus,
}

/// 一次扇出的汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub feedback_id: i64,
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DispatchReport {
    pub fn delivered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == DeliveryStatus::Delivered)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.delivered_count()
    }

    pub fn any_delivered(&self) -> bool {
        self.delivered_count() > 0
    }
}

/// 推送调度器
#[derive(Clone)]
pub struct NotificationDispatcher {
    destinations: Arc<dyn ChatDestinationStore>,
    transport: Arc<dyn MessageTransport>,
    users: Arc<dyn UserRepositoryTrait>,
    taxonomy: Arc<dyn TaxonomyRepositoryTrait>,
    feedbacks: Arc<dyn FeedbackRepositoryTrait>,
    formatter: FeedbackFormatter,
    delivery_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        destinations: Arc<dyn ChatDestinationStore>,
        transport: Arc<dyn MessageTransport>,
        users: Arc<dyn UserRepositoryTrait>,
        taxonomy: Arc<dyn TaxonomyRepositoryTrait>,
        feedbacks: Arc<dyn FeedbackRepositoryTrait>,
    ) -> Self {
        Self {
            destinations,
            transport,
            users,
            taxonomy,
            feedbacks,
            formatter: FeedbackFormatter::default(),
            delivery_timeout: Duration::from_millis(5000),
        }
    }

    /// 应用超时与时区配置
    pub fn with_config(mut self, config: &TelegramConfig) -> Self {
        self.delivery_timeout = Duration::from_millis(config.delivery_timeout_ms);
        self.formatter = FeedbackFormatter::with_offset_minutes(config.utc_offset_minutes);
        self
    }

    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    pub fn with_formatter(mut self, formatter: FeedbackFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// 解析消息中引用的名称；查询失败时降级为占位符
    async fn message_context(&self, feedback: &Feedback) -> MessageContext {
        let mut ctx = MessageContext::default();

        if let Some(score) = &feedback.waiter_score {
            match self.users.get_user(score.waiter_id).await {
                Ok(Some(user)) => {
                    ctx.waiter_first_name = Some(user.first_name);
                    ctx.waiter_second_name = Some(user.second_name);
                }
                Ok(None) => {}
                Err(e) => warn!(waiter_id = score.waiter_id, error = %e, "查询员工失败"),
            }
            match self.taxonomy.get_category(score.category_id).await {
                Ok(category) => ctx.category_name = category.map(|c| c.name),
                Err(e) => warn!(category_id = score.category_id, error = %e, "查询分类失败"),
            }
            match self.taxonomy.get_tag(score.tag_id).await {
                Ok(tag) => ctx.tag_name = tag.map(|t| t.name),
                Err(e) => warn!(tag_id = score.tag_id, error = %e, "查询标签失败"),
            }
        }

        for rating in &feedback.ratings {
            let name = match self.taxonomy.get_feedback_type(rating.feedback_type_id).await {
                Ok(Some(t)) => t.name,
                Ok(None) => format!("#{}", rating.feedback_type_id),
                Err(e) => {
                    warn!(feedback_type_id = rating.feedback_type_id, error = %e, "查询反馈类型失败");
                    format!("#{}", rating.feedback_type_id)
                }
            };
            ctx.ratings.push((name, rating.rating));
        }

        ctx
    }

    async fn deliver_one(&self, chat_id: String, text: &str) -> DeliveryOutcome {
        let status =
            match tokio::time::timeout(self.delivery_timeout, self.transport.deliver(&chat_id, text))
                .await
            {
                Ok(Ok(())) => DeliveryStatus::Delivered,
                Ok(Err(e)) => DeliveryStatus::Failed(e.to_string()),
                Err(_) => DeliveryStatus::TimedOut,
            };

        match &status {
            DeliveryStatus::Delivered => info!(chat_id = %chat_id, "反馈推送成功"),
            DeliveryStatus::Failed(reason) => {
                warn!(chat_id = %chat_id, reason = %reason, "反馈推送失败")
            }
            DeliveryStatus::TimedOut => warn!(
                chat_id = %chat_id,
                timeout_ms = self.delivery_timeout.as_millis() as u64,
                "反馈推送超时"
            ),
        }
        metrics::record_notification_delivery(status.as_str());

        DeliveryOutcome { chat_id, status }
    }

    /// 扇出一条反馈并等待全部会话完成
    #[instrument(skip(self, feedback), fields(feedback_id = feedback.id))]
    pub async fn dispatch(&self, feedback: &Feedback) -> DispatchReport {
        let start = Instant::now();

        let destinations = match self.destinations.list().await {
            Ok(list) => list,
            Err(e) => {
                error!(error = %e, "读取推送目标失败");
                Vec::new()
            }
        };

        if destinations.is_empty() {
            warn!("没有配置推送目标，跳过推送");
            return DispatchReport {
                feedback_id: feedback.id,
                outcomes: Vec::new(),
            };
        }

        let ctx = self.message_context(feedback).await;
        let text = self.formatter.format(feedback, &ctx);

        let outcomes = join_all(
            destinations
                .into_iter()
                .map(|d| self.deliver_one(d.chat_id, &text)),
        )
        .await;

        let report = DispatchReport {
            feedback_id: feedback.id,
            outcomes,
        };
        metrics::record_notification_fanout(report.outcomes.len(), start.elapsed().as_secs_f64());

        if report.any_delivered() {
            if let Err(e) = self.feedbacks.mark_notified(feedback.id).await {
                warn!(error = %e, "标记反馈已推送失败");
            }
        }

        if report.failed_count() == 0 {
            info!(delivered = report.delivered_count(), "反馈推送完成");
        } else if report.any_delivered() {
            warn!(
                delivered = report.delivered_count(),
                failed = report.failed_count(),
                "反馈部分推送成功"
            );
        } else {
            error!(failed = report.failed_count(), "反馈推送全部失败");
        }

        report
    }

    /// 在后台任务中扇出，不阻塞调用者
    pub fn dispatch_detached(&self, feedback: Feedback) -> JoinHandle<DispatchReport> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.dispatch(&feedback).await })
    }
}

impl FeedbackNotifier for NotificationDispatcher {
    fn notify(&self, feedback: Feedback) {
        drop(self.dispatch_detached(feedback));
    }
}
