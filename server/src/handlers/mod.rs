// HTTP Handlers
//
// 页面与 JSON/SSE 接口，全部通过 ChatModule 的命令和查询处理业务逻辑

mod chat;
mod conversation;
mod page;
mod session;

pub use chat::*;
pub use conversation::*;
pub use page::*;
pub use session::*;

use crate::infrastructure::AppState;
use crate::modules::chat::SharedSession;
use crate::shared::{AppError, AppResult};

/// 按 ID 查找会话上下文
pub(crate) async fn lookup_session(state: &AppState, session_id: &str) -> AppResult<SharedSession> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))
}
