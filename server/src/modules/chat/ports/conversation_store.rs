use async_trait::async_trait;
use thiserror::Error;

use super::super::domain::{
    Conversation, ConversationId, ConversationSummary, InvalidIdentity, UserId,
};

/// 存储错误类型
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidIdentity(#[from] InvalidIdentity),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// 会话存储端口
///
/// (用户, 会话标识) 到有序消息列表的持久映射。
/// 不加锁：同一标识的并发写入以最后一次为准。
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// 确保用户存储目录存在（幂等）
    async fn ensure_user_directory(&self, user: &UserId) -> Result<(), StoreError>;

    /// 列出用户的会话，最近修改的在前
    async fn list_conversations(
        &self,
        user: &UserId,
    ) -> Result<Vec<ConversationSummary>, StoreError>;

    /// 载入会话，不存在时返回 `NotFound`
    async fn load_conversation(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> Result<Conversation, StoreError>;

    /// 保存（覆盖）会话
    ///
    /// 会话没有消息时不写入任何内容并返回 `false`
    async fn save_conversation(
        &self,
        user: &UserId,
        conversation: &Conversation,
    ) -> Result<bool, StoreError>;

    /// 删除会话，不存在时返回 `NotFound`
    async fn delete_conversation(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> Result<(), StoreError>;
}
