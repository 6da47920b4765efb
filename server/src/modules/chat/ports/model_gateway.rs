use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

use super::super::domain::Message;

/// 模型网关错误类型
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {code} - {message}")]
    Api { code: String, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Model not available: {0}")]
    Unavailable(String),
}

/// 模型提供商类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenAI 兼容接口（vLLM、FastChat 等本地推理服务同样适用）
    #[default]
    OpenAI,
    Ollama,
    /// 离线回显，用于开发调试
    Echo,
}

/// 模型网关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    pub provider_type: ProviderType,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// 建立连接、等待响应头以及两次数据块之间的最长间隔（秒），不限制总生成时长
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// 空闲超时
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            base_url: "http://127.0.0.1:8000/v1".to_string(),
            api_key: String::new(),
            model: "Baichuan-13B-Chat".to_string(),
            timeout_secs: 120,
        }
    }
}

/// 流式回复片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyChunk {
    /// 增量文本，追加到回复末尾
    Delta(String),
    /// 累计快照，替换当前回复
    Snapshot(String),
}

impl ReplyChunk {
    /// 将片段合并进累计回复，返回本次新增的文本
    pub fn apply(self, reply: &mut String) -> String {
        match self {
            ReplyChunk::Delta(text) => {
                reply.push_str(&text);
                text
            }
            ReplyChunk::Snapshot(text) => {
                let delta = text
                    .strip_prefix(reply.as_str())
                    .map(str::to_string)
                    .unwrap_or_default();
                *reply = text;
                delta
            }
        }
    }
}

/// 生成请求
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// 消息历史（最旧的在前，以最新的用户消息结尾）
    pub messages: Vec<Message>,
    /// 最大生成 token 数
    pub max_tokens: Option<u32>,
    /// 温度参数 (0.0 - 2.0)
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, tokens: Option<u32>) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temp: Option<f32>) -> Self {
        self.temperature = temp;
        self
    }
}

pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<ReplyChunk, GatewayError>> + Send>>;

/// 模型网关端口
///
/// 惰性、有限、只进的回复流；调用方停止消费即视为放弃。
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// 网关名称（日志用）
    fn name(&self) -> &str;

    /// 流式生成回复
    async fn stream_reply(&self, request: GenerationRequest) -> Result<ReplyStream, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_deltas() {
        let mut reply = String::new();
        assert_eq!(ReplyChunk::Delta("He".into()).apply(&mut reply), "He");
        assert_eq!(ReplyChunk::Delta("llo".into()).apply(&mut reply), "llo");
        assert_eq!(reply, "Hello");
    }

    #[test]
    fn test_apply_snapshots_keeps_last() {
        let mut reply = String::new();
        for snapshot in ["H", "He", "Hel"] {
            ReplyChunk::Snapshot(snapshot.into()).apply(&mut reply);
        }
        assert_eq!(reply, "Hel");
    }

    #[test]
    fn test_snapshot_rewrite_has_no_delta() {
        let mut reply = "Hello".to_string();
        let delta = ReplyChunk::Snapshot("Help".into()).apply(&mut reply);
        assert_eq!(delta, "");
        assert_eq!(reply, "Help");
    }
}
