use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use super::lookup_session;
use crate::infrastructure::AppState;
use crate::modules::chat::{
    ConversationSummary, GetSessionViewQuery, OpenSessionCommand, ResetMode, ResetSessionCommand,
    SessionState, SessionView, SharedSession,
};
use crate::shared::{AppError, AppResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub user: String,
    pub title: String,
    pub greeting: String,
    pub conversations: Vec<ConversationSummary>,
}

/// 会话视图，空会话附带欢迎语
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionViewResponse {
    #[serde(flatten)]
    pub view: SessionView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

/// 读取会话视图
pub(crate) async fn render_view(
    state: &AppState,
    session: SharedSession,
) -> AppResult<SessionViewResponse> {
    let view = state.chat.session_view(GetSessionViewQuery::new(session)).await?;
    let greeting = (view.state == SessionState::Empty).then(|| state.ui.greeting.clone());
    Ok(SessionViewResponse { view, greeting })
}

pub async fn create_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> AppResult<Json<CreateSessionResponse>> {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let user = state.identity.resolve(&headers, peer);

    let opened = state
        .chat
        .open_session(OpenSessionCommand::new(user.clone()))
        .await?;
    let session_id = state
        .sessions
        .insert(Arc::new(Mutex::new(opened.session)))
        .await;

    info!("[Session] Opened {} for user={}", session_id, user);

    Ok(Json(CreateSessionResponse {
        session_id: session_id.to_string(),
        user: user.to_string(),
        title: state.ui.title.clone(),
        greeting: state.ui.greeting.clone(),
        conversations: opened.conversations,
    }))
}

pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionViewResponse>> {
    let session = lookup_session(&state, &session_id).await?;
    Ok(Json(render_view(&state, session).await?))
}

pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<StatusCode> {
    if !state.sessions.remove(&session_id).await {
        return Err(AppError::SessionNotFound(session_id));
    }

    info!("[Session] Closed {}", session_id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn new_conversation_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionViewResponse>> {
    reset(state, session_id, ResetMode::StartNew).await
}

pub async fn clear_conversation_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionViewResponse>> {
    reset(state, session_id, ResetMode::Clear).await
}

async fn reset(
    state: AppState,
    session_id: String,
    mode: ResetMode,
) -> AppResult<Json<SessionViewResponse>> {
    let session = lookup_session(&state, &session_id).await?;
    state
        .chat
        .reset_session(ResetSessionCommand::new(session.clone(), mode))
        .await?;
    Ok(Json(render_view(&state, session).await?))
}
