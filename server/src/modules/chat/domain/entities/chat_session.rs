use serde::Serialize;

use super::super::value_objects::{ConversationId, IdentityScheme, InvalidIdentity, UserId};
use super::{Conversation, Message};

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// 没有消息，界面显示欢迎语
    Empty,
    /// 至少有一条消息
    Active,
}

/// 聊天会话状态
///
/// 一个浏览器会话当前展示的对话，与持久化时机解耦。
/// 内存中的消息列表是发送给模型和写入存储的唯一来源。
///
/// 每次重置（新建、清空、载入）都会递增 `revision`，
/// 进行中的回复据此判断会话是否已被重置。
#[derive(Debug, Clone)]
pub struct ChatSession {
    user: UserId,
    scheme: IdentityScheme,
    conversation: Option<Conversation>,
    revision: u64,
}

impl ChatSession {
    pub fn new(user: UserId, scheme: IdentityScheme) -> Self {
        Self {
            user,
            scheme,
            conversation: None,
            revision: 0,
        }
    }

    // Getters
    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn scheme(&self) -> IdentityScheme {
        self.scheme
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation.as_ref().map(|c| c.id())
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation
            .as_ref()
            .map(|c| c.messages())
            .unwrap_or(&[])
    }

    pub fn state(&self) -> SessionState {
        if self.messages().is_empty() {
            SessionState::Empty
        } else {
            SessionState::Active
        }
    }

    // 状态迁移

    /// 开始新对话
    pub fn start_new(&mut self) -> SessionState {
        self.reset(None)
    }

    /// 清空当前对话，不删除已持久化的文件
    pub fn clear(&mut self) -> SessionState {
        self.reset(None)
    }

    /// 载入已保存的对话
    pub fn load(&mut self, conversation: Conversation) -> SessionState {
        self.reset(Some(conversation))
    }

    /// 追加消息
    ///
    /// 空会话中的第一条消息会创建对话并推导其标识；
    /// 推导失败时状态保持不变。
    pub fn append(&mut self, message: Message) -> Result<SessionState, InvalidIdentity> {
        match self.conversation.as_mut() {
            Some(conversation) => conversation.push(message),
            None => {
                let id = self.scheme.derive(message.content())?;
                self.conversation = Some(Conversation::begin(id, message));
            }
        }
        Ok(SessionState::Active)
    }

    fn reset(&mut self, conversation: Option<Conversation>) -> SessionState {
        self.conversation = conversation;
        self.revision += 1;
        self.state()
    }
}
