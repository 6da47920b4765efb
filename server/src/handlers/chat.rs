use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;

use super::lookup_session;
use crate::infrastructure::AppState;
use crate::modules::chat::{SendMessageCommand, TurnEvent};
use crate::shared::AppResult;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// 发送消息，以 SSE 推送回复
///
/// 每个片段同时发送 `delta`（增量）和 `snapshot`（累计）事件，
/// 最后以 `done`、`error` 或 `discarded` 结束
pub async fn send_message_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let session = lookup_session(&state, &session_id).await?;

    let (_, rx) = state
        .chat
        .send_message_stream(SendMessageCommand::new(session, payload.content))
        .await?;

    let stream = ReceiverStream::new(rx)
        .flat_map(|event| stream::iter(to_sse_events(event)))
        .map(Ok);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_events(event: TurnEvent) -> Vec<Event> {
    match event {
        TurnEvent::Delta { delta, snapshot } => vec![
            Event::default()
                .event("delta")
                .data(json!({ "text": delta }).to_string()),
            Event::default()
                .event("snapshot")
                .data(json!({ "text": snapshot }).to_string()),
        ],
        TurnEvent::Done {
            content,
            conversation_id,
            saved,
        } => {
            let data = json!({
                "content": content,
                "conversationId": conversation_id,
                "saved": saved
            });
            vec![Event::default().event("done").data(data.to_string())]
        }
        TurnEvent::Error(message) => vec![Event::default()
            .event("error")
            .data(json!({ "message": message }).to_string())],
        TurnEvent::Discarded => vec![Event::default().event("discarded").data("{}")],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_yields_both_renderings() {
        let events = to_sse_events(TurnEvent::Delta {
            delta: "lo".to_string(),
            snapshot: "Hello".to_string(),
        });
        assert_eq!(events.len(), 2);

        let events = to_sse_events(TurnEvent::Error("boom".to_string()));
        assert_eq!(events.len(), 1);
    }
}
