//! 消息传输
//!
//! 调度器只依赖 `MessageTransport`，Telegram Bot API 是其中一种实现。

use async_trait::async_trait;
use hrm_shared::config::TelegramConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FeedbackError, Result};

/// 向单个会话投递一条文本消息
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn deliver(&self, chat_id: &str, text: &str) -> Result<()>;
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

/// Telegram Bot API 传输
pub struct TelegramTransport {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl TelegramTransport {
    pub fn new(client: reqwest::Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        }
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    async fn deliver(&self, chat_id: &str, text: &str) -> Result<()> {
        if self.bot_token.is_empty() {
            return Err(FeedbackError::Delivery("未配置 Telegram bot token".to_string()));
        }

        // reqwest 的错误信息包含完整 URL，去掉后再记录以免泄露 token
        let response = self
            .client
            .post(self.send_message_url())
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            .map_err(|e| FeedbackError::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        let body: Option<TelegramResponse> = response.json().await.ok();

        match body {
            Some(TelegramResponse { ok: true, .. }) if status.is_success() => {
                debug!(chat_id = %chat_id, "Telegram 消息已投递");
                Ok(())
            }
            Some(TelegramResponse { description, .. }) => Err(FeedbackError::Delivery(format!(
                "Telegram 返回 {}: {}",
                status,
                description.unwrap_or_default()
            ))),
            None => Err(FeedbackError::Delivery(format!(
                "Telegram 返回 {status}，响应体无法解析"
            ))),
        }
    }
}
