use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::value_objects::ConversationId;
use super::Message;

/// 标题最多保留的字符数
const TITLE_MAX_CHARS: usize = 20;

/// 会话实体 - 聚合根
///
/// 一次完整的对话，作为一个整体持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// 会话标识（文件名主干）
    id: ConversationId,
    /// 展示用标题
    title: String,
    /// 创建时间
    created_at: DateTime<Utc>,
    /// 更新时间
    updated_at: DateTime<Utc>,
    /// 有序消息列表
    messages: Vec<Message>,
}

impl Conversation {
    /// 以首条消息开启新会话
    pub fn begin(id: ConversationId, first_message: Message) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: Self::generate_title(first_message.content()),
            created_at: now,
            updated_at: now,
            messages: vec![first_message],
        }
    }

    /// 从存储恢复
    pub fn restore(
        id: ConversationId,
        title: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            id,
            title,
            created_at,
            updated_at,
            messages,
        }
    }

    /// 从旧版纯消息数组恢复，标题取自首条消息
    pub fn from_messages(
        id: ConversationId,
        messages: Vec<Message>,
        modified_at: DateTime<Utc>,
    ) -> Self {
        let title = messages
            .first()
            .map(|m| Self::generate_title(m.content()))
            .unwrap_or_else(|| id.to_string());
        Self {
            id,
            title,
            created_at: modified_at,
            updated_at: modified_at,
            messages,
        }
    }

    // Getters
    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// 追加消息
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    /// 会话摘要（侧边栏使用）
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// 根据消息内容生成标题（取前 20 个字符）
    pub fn generate_title(content: &str) -> String {
        let content = content.trim();
        let title: String = content.chars().take(TITLE_MAX_CHARS).collect();
        if content.chars().count() > TITLE_MAX_CHARS {
            format!("{}...", title)
        } else {
            title
        }
    }
}

/// 会话摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}
