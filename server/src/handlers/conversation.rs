use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::lookup_session;
use super::session::{render_view, SessionViewResponse};
use crate::infrastructure::AppState;
use crate::modules::chat::{
    ConversationId, ConversationSummary, DeleteConversationCommand, ListConversationsQuery,
    SelectConversationCommand,
};
use crate::shared::AppResult;

pub async fn list_conversations_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<Vec<ConversationSummary>>> {
    let session = lookup_session(&state, &session_id).await?;
    let user = session.lock().await.user().clone();

    let conversations = state
        .chat
        .list_conversations(ListConversationsQuery::new(user))
        .await?;
    Ok(Json(conversations))
}

pub async fn select_conversation_handler(
    State(state): State<AppState>,
    Path((session_id, conversation_id)): Path<(String, String)>,
) -> AppResult<Json<SessionViewResponse>> {
    let session = lookup_session(&state, &session_id).await?;
    let conversation_id = ConversationId::parse(&conversation_id)?;

    state
        .chat
        .select_conversation(SelectConversationCommand::new(
            session.clone(),
            conversation_id,
        ))
        .await?;
    Ok(Json(render_view(&state, session).await?))
}

pub async fn delete_conversation_handler(
    State(state): State<AppState>,
    Path((session_id, conversation_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let session = lookup_session(&state, &session_id).await?;
    let conversation_id = ConversationId::parse(&conversation_id)?;
    let user = session.lock().await.user().clone();

    state
        .chat
        .delete_conversation(DeleteConversationCommand::new(user, conversation_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
