use async_trait::async_trait;
use std::sync::Arc;

use super::super::{ApplicationError, QueryHandler};
use crate::modules::chat::domain::{ConversationSummary, UserId};
use crate::modules::chat::ports::ConversationStore;

/// 列出已保存对话查询
#[derive(Debug, Clone)]
pub struct ListConversationsQuery {
    pub user: UserId,
}

impl ListConversationsQuery {
    pub fn new(user: UserId) -> Self {
        Self { user }
    }
}

/// 列出已保存对话查询处理器（最近修改的在前）
pub struct ListConversationsHandler {
    store: Arc<dyn ConversationStore>,
}

impl ListConversationsHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueryHandler<ListConversationsQuery, Vec<ConversationSummary>> for ListConversationsHandler {
    async fn handle(
        &self,
        query: ListConversationsQuery,
    ) -> Result<Vec<ConversationSummary>, ApplicationError> {
        Ok(self.store.list_conversations(&query.user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::{Conversation, ConversationId, Message};
    use crate::modules::chat::infrastructure::InMemoryConversationStore;

    #[tokio::test]
    async fn test_list_conversations() {
        let store = Arc::new(InMemoryConversationStore::new());
        let alice = UserId::parse("alice").unwrap();
        let bob = UserId::parse("bob").unwrap();

        for text in ["first", "second"] {
            let c = Conversation::begin(ConversationId::generate(), Message::new_user(text));
            store.save_conversation(&alice, &c).await.unwrap();
        }

        let handler = ListConversationsHandler::new(store);
        let listed = handler
            .handle(ListConversationsQuery::new(alice))
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "second");

        let listed = handler.handle(ListConversationsQuery::new(bob)).await.unwrap();
        assert!(listed.is_empty());
    }
}
