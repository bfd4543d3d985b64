//! 推送目标会话存储
//!
//! 会话列表很小且只由管理员修改，持久化为磁盘上的 JSON 数组。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::{FeedbackError, Result};

/// 一个推送目标会话
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatDestination {
    pub id: String,
    pub chat_id: String,
}

/// 推送目标存储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatDestinationStore: Send + Sync {
    async fn list(&self) -> Result<Vec<ChatDestination>>;
    /// chat_id 已存在时返回 Conflict
    async fn add(&self, chat_id: &str) -> Result<ChatDestination>;
    /// 按 id 删除，不存在时返回 NotFound
    async fn remove(&self, id: &str) -> Result<()>;
}

/// 校验并规范化 chat_id：Telegram 会话 id 为可带负号的整数或 `@频道名`
pub fn normalize_chat_id(chat_id: &str) -> Result<String> {
    let chat_id = chat_id.trim();
    let digits = chat_id.strip_prefix('-').unwrap_or(chat_id);
    let numeric = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    let channel = chat_id.len() > 1
        && chat_id.starts_with('@')
        && chat_id[1..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if numeric || channel {
        Ok(chat_id.to_string())
    } else {
        Err(FeedbackError::Validation(format!(
            "无效的 Telegram chat_id: {chat_id}"
        )))
    }
}

fn io_error(path: &Path, err: impl std::fmt::Display) -> FeedbackError {
    FeedbackError::Internal(format!("读写推送目标文件 {} 失败: {}", path.display(), err))
}

/// 基于 JSON 文件的推送目标存储
///
/// 读写都持有同一把锁；写入先落临时文件再原子重命名。
pub struct JsonFileDestinationStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileDestinationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件不存在视为空列表
    async fn read_all(&self) -> Result<Vec<ChatDestination>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| io_error(&self.path, e))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(io_error(&self.path, e)),
        }
    }

    async fn write_all(&self, destinations: &[ChatDestination]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(&self.path, e))?;
        }

        let bytes =
            serde_json::to_vec_pretty(destinations).map_err(|e| io_error(&self.path, e))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;
        Ok(())
    }
}

#[async_trait]
impl ChatDestinationStore for JsonFileDestinationStore {
    async fn list(&self) -> Result<Vec<ChatDestination>> {
        let _guard = self.lock.read().await;
        self.read_all().await
    }

    async fn add(&self, chat_id: &str) -> Result<ChatDestination> {
        let chat_id = normalize_chat_id(chat_id)?;
        let _guard = self.lock.write().await;

        let mut destinations = self.read_all().await?;
        if destinations.iter().any(|d| d.chat_id == chat_id) {
            return Err(FeedbackError::Conflict(format!(
                "chat_id 已存在: {chat_id}"
            )));
        }

        let destination = ChatDestination {
            id: Uuid::now_v7().to_string(),
            chat_id,
        };
        destinations.push(destination.clone());
        self.write_all(&destinations).await?;

        info!(
            destination_id = %destination.id,
            chat_id = %destination.chat_id,
            "推送目标已添加"
        );
        Ok(destination)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.lock.write().await;

        let mut destinations = self.read_all().await?;
        let before = destinations.len();
        destinations.retain(|d| d.id != id);
        if destinations.len() == before {
            return Err(FeedbackError::not_found("chat_destination", id));
        }
        self.write_all(&destinations).await?;

        info!(destination_id = %id, "推送目标已删除");
        Ok(())
    }
}
