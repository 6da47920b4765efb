use async_trait::async_trait;
use serde::Serialize;

use super::super::{ApplicationError, QueryHandler, SharedSession};
use crate::modules::chat::domain::{ConversationId, Message, SessionState};

/// 获取会话视图查询
#[derive(Debug, Clone)]
pub struct GetSessionViewQuery {
    pub session: SharedSession,
}

impl GetSessionViewQuery {
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }
}

/// 会话视图：页面渲染当前对话所需的全部内容
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user: String,
    pub state: SessionState,
    pub conversation_id: Option<ConversationId>,
    pub title: Option<String>,
    pub messages: Vec<Message>,
}

/// 获取会话视图查询处理器
#[derive(Debug, Default)]
pub struct GetSessionViewHandler;

impl GetSessionViewHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QueryHandler<GetSessionViewQuery, SessionView> for GetSessionViewHandler {
    async fn handle(&self, query: GetSessionViewQuery) -> Result<SessionView, ApplicationError> {
        let session = query.session.lock().await;

        Ok(SessionView {
            user: session.user().to_string(),
            state: session.state(),
            conversation_id: session.conversation_id().cloned(),
            title: session.conversation().map(|c| c.title().to_string()),
            messages: session.messages().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::{ChatSession, IdentityScheme, UserId};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn test_session_view() {
        let session = Arc::new(Mutex::new(ChatSession::new(
            UserId::parse("alice").unwrap(),
            IdentityScheme::Generated,
        )));
        let handler = GetSessionViewHandler::new();

        let view = handler
            .handle(GetSessionViewQuery::new(session.clone()))
            .await
            .unwrap();
        assert_eq!(view.state, SessionState::Empty);
        assert!(view.title.is_none());

        session
            .lock()
            .await
            .append(Message::new_user("hi there"))
            .unwrap();
        let view = handler
            .handle(GetSessionViewQuery::new(session))
            .await
            .unwrap();
        assert_eq!(view.state, SessionState::Active);
        assert_eq!(view.title.as_deref(), Some("hi there"));
        assert_eq!(view.messages.len(), 1);
    }
}
