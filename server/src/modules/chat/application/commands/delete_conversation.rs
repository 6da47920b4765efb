use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::super::{ApplicationError, CommandHandler};
use crate::modules::chat::domain::{ConversationId, UserId};
use crate::modules::chat::ports::ConversationStore;

/// 删除已保存对话命令
///
/// 只删除存储中的文件，不影响正在展示该对话的会话
#[derive(Debug, Clone)]
pub struct DeleteConversationCommand {
    pub user: UserId,
    pub conversation_id: ConversationId,
}

impl DeleteConversationCommand {
    pub fn new(user: UserId, conversation_id: ConversationId) -> Self {
        Self {
            user,
            conversation_id,
        }
    }
}

/// 删除已保存对话命令处理器
pub struct DeleteConversationHandler {
    store: Arc<dyn ConversationStore>,
}

impl DeleteConversationHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler<DeleteConversationCommand, ()> for DeleteConversationHandler {
    async fn handle(&self, command: DeleteConversationCommand) -> Result<(), ApplicationError> {
        self.store
            .delete_conversation(&command.user, &command.conversation_id)
            .await?;

        info!(
            "[DeleteConversation] user={} deleted {}",
            command.user, command.conversation_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::{Conversation, Message};
    use crate::modules::chat::infrastructure::InMemoryConversationStore;
    use crate::modules::chat::ports::StoreError;

    #[tokio::test]
    async fn test_delete_conversation() {
        let store = Arc::new(InMemoryConversationStore::new());
        let user = UserId::parse("alice").unwrap();
        let saved = Conversation::begin(ConversationId::generate(), Message::new_user("hi"));
        store.save_conversation(&user, &saved).await.unwrap();

        let handler = DeleteConversationHandler::new(store.clone());
        handler
            .handle(DeleteConversationCommand::new(
                user.clone(),
                saved.id().clone(),
            ))
            .await
            .unwrap();

        assert_eq!(store.count(&user).await, 0);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_conversation() {
        let store = Arc::new(InMemoryConversationStore::new());
        let handler = DeleteConversationHandler::new(store);

        let result = handler
            .handle(DeleteConversationCommand::new(
                UserId::parse("alice").unwrap(),
                ConversationId::generate(),
            ))
            .await;

        assert!(matches!(
            result,
            Err(ApplicationError::StoreError(StoreError::NotFound(_)))
        ));
    }
}
