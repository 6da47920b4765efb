use async_trait::async_trait;

use super::super::{ApplicationError, CommandHandler, SharedSession};
use crate::modules::chat::domain::SessionState;

/// 重置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// 开始新对话
    StartNew,
    /// 清空当前对话，不影响已保存的文件
    Clear,
}

/// 重置会话命令
#[derive(Debug, Clone)]
pub struct ResetSessionCommand {
    pub session: SharedSession,
    pub mode: ResetMode,
}

impl ResetSessionCommand {
    pub fn new(session: SharedSession, mode: ResetMode) -> Self {
        Self { session, mode }
    }
}

/// 重置会话命令处理器
#[derive(Debug, Default)]
pub struct ResetSessionHandler;

impl ResetSessionHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandHandler<ResetSessionCommand, SessionState> for ResetSessionHandler {
    async fn handle(&self, command: ResetSessionCommand) -> Result<SessionState, ApplicationError> {
        let mut session = command.session.lock().await;
        let state = match command.mode {
            ResetMode::StartNew => session.start_new(),
            ResetMode::Clear => session.clear(),
        };
        Ok(state)
    }
}
