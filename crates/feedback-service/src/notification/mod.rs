//! 通知模块
//!
//! 新反馈推送到 Telegram 会话，密码重置通过邮件发送。
//!
//! ## 功能特性
//!
//! - **异步扇出**：推送在后台任务中进行，不阻塞反馈提交
//! - **部分失败容忍**：单个会话失败或超时不影响其他会话
//! - **可替换传输**：Telegram 与邮件均通过 trait 抽象，测试中使用录制实现

pub mod destinations;
pub mod dispatcher;
pub mod email;
pub mod formatter;
pub mod transport;

pub use destinations::{ChatDestination, ChatDestinationStore, JsonFileDestinationStore};
pub use dispatcher::{
    DeliveryOutcome, DeliveryStatus, DispatchReport, FeedbackNotifier, NotificationDispatcher,
};
pub use email::{
    EmailMessage, EmailTransport, HttpEmailTransport, LogEmailTransport,
    email_transport_from_config, password_reset_email,
};
pub use formatter::{FeedbackFormatter, MessageContext};
pub use transport::{MessageTransport, TelegramTransport};
