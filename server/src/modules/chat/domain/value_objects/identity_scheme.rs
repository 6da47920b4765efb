use serde::{Deserialize, Serialize};

use super::{ConversationId, InvalidIdentity};

/// 会话标识的生成方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityScheme {
    /// 随机生成标识，标题单独保存
    #[default]
    Generated,
    /// 以首条消息文本为标识（旧版布局）
    ///
    /// 首条消息相同的两个会话会互相覆盖，最后写入者胜出。
    FirstMessage,
}

impl IdentityScheme {
    /// 根据首条消息推导会话标识
    pub fn derive(&self, first_message: &str) -> Result<ConversationId, InvalidIdentity> {
        match self {
            IdentityScheme::Generated => Ok(ConversationId::generate()),
            IdentityScheme::FirstMessage => ConversationId::from_first_message(first_message),
        }
    }

    /// 持久化文件扩展名
    pub fn file_extension(&self) -> &'static str {
        match self {
            IdentityScheme::Generated => "json",
            IdentityScheme::FirstMessage => "txt",
        }
    }
}
