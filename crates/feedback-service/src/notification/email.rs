//! 邮件发送
//!
//! 生产环境通过 HTTP 邮件网关发送；未启用时退化为只写日志。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hrm_shared::config::EmailConfig;
use serde::Serialize;
use tracing::info;

use crate::error::{FeedbackError, Result};

/// 一封待发送的邮件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// 邮件传输接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// 按配置构建邮件传输
pub fn email_transport_from_config(
    client: reqwest::Client,
    config: &EmailConfig,
) -> Arc<dyn EmailTransport> {
    match (&config.endpoint, config.enabled) {
        (Some(endpoint), true) => Arc::new(HttpEmailTransport {
            client,
            endpoint: endpoint.clone(),
            api_key: config.api_key.clone(),
            from: config.from_address.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }),
        _ => Arc::new(LogEmailTransport),
    }
}

/// 只记录日志的邮件传输，用于开发环境
pub struct LogEmailTransport;

#[async_trait]
impl EmailTransport for LogEmailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body_len = message.html.len(),
            "邮件发送未启用，仅记录日志"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct GatewayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// HTTP 邮件网关传输
pub struct HttpEmailTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
    timeout: Duration,
}

#[async_trait]
impl EmailTransport for HttpEmailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&GatewayPayload {
                from: &self.from,
                to: &message.to,
                subject: &message.subject,
                html: &message.html,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FeedbackError::Delivery(format!("邮件网关请求失败: {e}")))?;

        if !response.status().is_success() {
            return Err(FeedbackError::Delivery(format!(
                "邮件网关返回 {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// 密码重置邮件
pub fn password_reset_email(to: &str, user_name: &str, reset_link: &str) -> EmailMessage {
    let html = format!(
        r#"<html>
<head><meta charset="utf-8"></head>
<body style="font-family: 'Trebuchet MS', Arial, sans-serif; background-color: #f8f4e5;">
  <div style="max-width: 600px; margin: 20px auto; background-color: #fff; border-radius: 15px;">
    <div style="background-color: #ff6b6b; color: white; padding: 25px 30px; text-align: center;">
      <h1>Обновление пароля в ZernoHub!</h1>
    </div>
    <div style="padding: 25px 30px; color: #444;">
      <p>Приветствуем, {user_name}! 👋</p>
      <p>Мы получили запрос на сброс пароля для вашей учетной записи в ZernoHub.</p>
      <a href="{reset_link}" style="display: block; background-color: #4ecdc4; color: white; padding: 15px 25px; text-decoration: none; border-radius: 50px; text-align: center; margin: 25px auto; max-width: 250px;">Сбросить пароль</a>
      <p style="background-color: #ffe66d; border-radius: 12px; padding: 10px 15px; text-align: center;">⏱️ Ссылка действительна в течение 1 часа</p>
      <p>Если вы не запрашивали сброс пароля, просто проигнорируйте это письмо.</p>
    </div>
    <div style="padding: 20px; text-align: center; color: #666; font-size: 14px;">ZernoHub</div>
  </div>
</body>
</html>"#
    );

    EmailMessage {
        to: to.to_string(),
        subject: "Сброс пароля ZernoHub".to_string(),
        html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_email_contains_link_and_name() {
        let email = password_reset_email(
            "anna@example.com",
            "Анна Петрова",
            "https://hrm.example.com/reset-password?token=abc",
        );
        assert_eq!(email.to, "anna@example.com");
        assert_eq!(email.subject, "Сброс пароля ZernoHub");
        assert!(email.html.contains("Приветствуем, Анна Петрова!"));
        assert!(email.html.contains(r#"href="https://hrm.example.com/reset-password?token=abc""#));
        assert!(email.html.contains("1 часа"));
    }

    #[tokio::test]
    async fn test_disabled_config_logs_only() {
        let transport =
            email_transport_from_config(reqwest::Client::new(), &EmailConfig::default());
        let email = password_reset_email("a@b.c", "A B", "http://x");
        assert!(transport.send(&email).await.is_ok());
    }
}
