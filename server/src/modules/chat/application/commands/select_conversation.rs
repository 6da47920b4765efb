use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::super::{ApplicationError, CommandHandler, SharedSession};
use crate::modules::chat::domain::{ConversationId, SessionState};
use crate::modules::chat::ports::ConversationStore;

/// 选择已保存对话命令
#[derive(Debug, Clone)]
pub struct SelectConversationCommand {
    pub session: SharedSession,
    pub conversation_id: ConversationId,
}

impl SelectConversationCommand {
    pub fn new(session: SharedSession, conversation_id: ConversationId) -> Self {
        Self {
            session,
            conversation_id,
        }
    }
}

/// 选择已保存对话命令处理器
pub struct SelectConversationHandler {
    store: Arc<dyn ConversationStore>,
}

impl SelectConversationHandler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler<SelectConversationCommand, SessionState> for SelectConversationHandler {
    async fn handle(
        &self,
        command: SelectConversationCommand,
    ) -> Result<SessionState, ApplicationError> {
        let user = command.session.lock().await.user().clone();

        // 读取文件期间不持有会话锁
        let conversation = self
            .store
            .load_conversation(&user, &command.conversation_id)
            .await?;

        debug!(
            "[SelectConversation] user={} loaded {} ({} messages)",
            user,
            command.conversation_id,
            conversation.len()
        );

        Ok(command.session.lock().await.load(conversation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::{
        ChatSession, Conversation, IdentityScheme, Message, UserId,
    };
    use crate::modules::chat::infrastructure::InMemoryConversationStore;
    use crate::modules::chat::ports::StoreError;
    use tokio::sync::Mutex;

    fn session() -> SharedSession {
        Arc::new(Mutex::new(ChatSession::new(
            UserId::parse("alice").unwrap(),
            IdentityScheme::Generated,
        )))
    }

    #[tokio::test]
    async fn test_select_loads_messages() {
        let store = Arc::new(InMemoryConversationStore::new());
        let user = UserId::parse("alice").unwrap();
        let mut saved = Conversation::begin(ConversationId::generate(), Message::new_user("hi"));
        saved.push(Message::new_assistant("hello"));
        store.save_conversation(&user, &saved).await.unwrap();

        let handler = SelectConversationHandler::new(store);
        let session = session();
        let state = handler
            .handle(SelectConversationCommand::new(
                session.clone(),
                saved.id().clone(),
            ))
            .await
            .unwrap();

        assert_eq!(state, SessionState::Active);
        assert_eq!(session.lock().await.messages(), saved.messages());
    }

    #[tokio::test]
    async fn test_select_missing_keeps_session() {
        let handler = SelectConversationHandler::new(Arc::new(InMemoryConversationStore::new()));
        let session = session();
        session
            .lock()
            .await
            .append(Message::new_user("draft"))
            .unwrap();

        let result = handler
            .handle(SelectConversationCommand::new(
                session.clone(),
                ConversationId::generate(),
            ))
            .await;

        assert!(matches!(
            result,
            Err(ApplicationError::StoreError(StoreError::NotFound(_)))
        ));
        assert_eq!(session.lock().await.messages().len(), 1);
    }
}
