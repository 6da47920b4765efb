use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde_json::{json, Value};

use crate::infrastructure::AppState;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// 聊天页面
pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(INDEX_HTML.replace("{{title}}", &html_escape(&state.ui.title)))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "gateway": state.chat.gateway().name(),
        "sessions": state.sessions.len().await
    }))
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
