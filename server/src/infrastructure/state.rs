use std::sync::Arc;
use std::time::Duration;

use super::{ClientIdentity, SessionRegistry};
use crate::modules::chat::ChatModule;
use crate::modules::config::UiConfig;

/// 应用全局状态
///
/// 会话内容由 ChatModule 管理，这里只保留 HTTP 层需要的共享对象
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatModule>,
    pub sessions: Arc<SessionRegistry>,
    pub identity: ClientIdentity,
    pub ui: Arc<UiConfig>,
}

impl AppState {
    pub fn new(
        chat: ChatModule,
        identity: ClientIdentity,
        ui: UiConfig,
        session_idle_timeout: Duration,
    ) -> Self {
        Self {
            chat: Arc::new(chat),
            sessions: Arc::new(SessionRegistry::new(session_idle_timeout)),
            identity,
            ui: Arc::new(ui),
        }
    }
}
