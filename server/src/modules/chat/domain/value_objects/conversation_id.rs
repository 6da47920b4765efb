use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::check_path_segment;

/// 标识不能安全地用作文件名
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid identity {value:?}: {reason}")]
pub struct InvalidIdentity {
    pub value: String,
    pub reason: String,
}

/// 会话（对话）唯一标识符
///
/// 值对象：对应存储目录中的文件名主干。默认由 UUID 生成；
/// 兼容模式下直接取首条消息文本，因此内部保存为字符串。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationId(String);

impl ConversationId {
    /// 生成新的随机标识
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// 从字符串解析（来自 URL 或文件名）
    pub fn parse(s: &str) -> Result<Self, InvalidIdentity> {
        check_path_segment(s).map_err(|reason| InvalidIdentity {
            value: s.to_string(),
            reason,
        })?;
        Ok(Self(s.to_string()))
    }

    /// 以首条消息文本作为标识（兼容旧版存储布局）
    pub fn from_first_message(content: &str) -> Result<Self, InvalidIdentity> {
        Self::parse(content)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ConversationId {
    type Error = InvalidIdentity;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ConversationId> for String {
    fn from(id: ConversationId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let id1 = ConversationId::generate();
        let id2 = ConversationId::generate();
        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 32);
    }

    #[test]
    fn test_first_message_identity() {
        let id = ConversationId::from_first_message("hi").unwrap();
        assert_eq!(id.as_str(), "hi");

        // 中文与空格都是合法文件名
        assert!(ConversationId::from_first_message("今天天气怎么样 ?").is_ok());
    }

    #[test]
    fn test_rejects_path_unsafe_text() {
        for bad in ["", ".", "..", "a/b", "..\\up", "line\nbreak"] {
            assert!(
                ConversationId::from_first_message(bad).is_err(),
                "{:?} should be rejected",
                bad
            );
        }

        let long = "长".repeat(100);
        assert!(ConversationId::from_first_message(&long).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ConversationId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(ok.as_str(), "abc");
        assert!(serde_json::from_str::<ConversationId>("\"../etc\"").is_err());
    }
}
