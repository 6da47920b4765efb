use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::modules::chat::domain::{Conversation, ConversationId, ConversationSummary, UserId};
use crate::modules::chat::ports::{ConversationStore, StoreError};

/// 单个用户的会话，附带写入序号用于排序
type UserShelf = HashMap<ConversationId, (u64, Conversation)>;

/// 内存会话存储
///
/// 用于开发和测试，进程退出后数据丢失
#[derive(Default)]
pub struct InMemoryConversationStore {
    users: RwLock<HashMap<UserId, UserShelf>>,
    sequence: AtomicU64,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 某个用户已保存的会话数量
    pub async fn count(&self, user: &UserId) -> usize {
        let users = self.users.read().await;
        users.get(user).map(|shelf| shelf.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn ensure_user_directory(&self, user: &UserId) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        users.entry(user.clone()).or_default();
        Ok(())
    }

    async fn list_conversations(
        &self,
        user: &UserId,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let users = self.users.read().await;
        let Some(shelf) = users.get(user) else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<&(u64, Conversation)> = shelf.values().collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(entries.into_iter().map(|(_, c)| c.summary()).collect())
    }

    async fn load_conversation(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> Result<Conversation, StoreError> {
        let users = self.users.read().await;
        users
            .get(user)
            .and_then(|shelf| shelf.get(id))
            .map(|(_, conversation)| conversation.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn save_conversation(
        &self,
        user: &UserId,
        conversation: &Conversation,
    ) -> Result<bool, StoreError> {
        if conversation.is_empty() {
            return Ok(false);
        }

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.write().await;
        users
            .entry(user.clone())
            .or_default()
            .insert(conversation.id().clone(), (seq, conversation.clone()));
        Ok(true)
    }

    async fn delete_conversation(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        users
            .get_mut(user)
            .and_then(|shelf| shelf.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}
