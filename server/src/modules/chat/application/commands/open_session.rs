use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::super::{ApplicationError, CommandHandler};
use crate::modules::chat::domain::{ChatSession, ConversationSummary, IdentityScheme, UserId};
use crate::modules::chat::ports::ConversationStore;

/// 打开会话命令
///
/// 浏览器连接时执行：确保用户目录存在，返回新的空会话和已保存的对话列表
#[derive(Debug, Clone)]
pub struct OpenSessionCommand {
    pub user: UserId,
}

impl OpenSessionCommand {
    pub fn new(user: UserId) -> Self {
        Self { user }
    }
}

/// 打开会话响应
#[derive(Debug, Clone)]
pub struct OpenSessionResponse {
    pub session: ChatSession,
    pub conversations: Vec<ConversationSummary>,
}

/// 打开会话命令处理器
pub struct OpenSessionHandler {
    store: Arc<dyn ConversationStore>,
    scheme: IdentityScheme,
}

impl OpenSessionHandler {
    pub fn new(store: Arc<dyn ConversationStore>, scheme: IdentityScheme) -> Self {
        Self { store, scheme }
    }
}

#[async_trait]
impl CommandHandler<OpenSessionCommand, OpenSessionResponse> for OpenSessionHandler {
    async fn handle(
        &self,
        command: OpenSessionCommand,
    ) -> Result<OpenSessionResponse, ApplicationError> {
        self.store.ensure_user_directory(&command.user).await?;
        let conversations = self.store.list_conversations(&command.user).await?;

        debug!(
            "[OpenSession] user={} has {} saved conversations",
            command.user,
            conversations.len()
        );

        Ok(OpenSessionResponse {
            session: ChatSession::new(command.user, self.scheme),
            conversations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::{Conversation, ConversationId, Message, SessionState};
    use crate::modules::chat::infrastructure::InMemoryConversationStore;

    #[tokio::test]
    async fn test_open_lists_saved_conversations() {
        let store = Arc::new(InMemoryConversationStore::new());
        let user = UserId::parse("alice").unwrap();
        let saved = Conversation::begin(ConversationId::generate(), Message::new_user("hi"));
        store.save_conversation(&user, &saved).await.unwrap();

        let handler = OpenSessionHandler::new(store, IdentityScheme::Generated);
        let response = handler
            .handle(OpenSessionCommand::new(user.clone()))
            .await
            .unwrap();

        assert_eq!(response.session.state(), SessionState::Empty);
        assert_eq!(response.session.user(), &user);
        assert_eq!(response.conversations.len(), 1);
        assert_eq!(&response.conversations[0].id, saved.id());
    }

    #[tokio::test]
    async fn test_open_new_user() {
        let store = Arc::new(InMemoryConversationStore::new());
        let handler = OpenSessionHandler::new(store, IdentityScheme::Generated);

        let response = handler
            .handle(OpenSessionCommand::new(UserId::parse("bob").unwrap()))
            .await
            .unwrap();

        assert!(response.conversations.is_empty());
    }
}
