// OpenAI 兼容网关
//
// 适用于 OpenAI 以及 vLLM、FastChat 等提供 /chat/completions 接口的本地推理服务

use async_trait::async_trait;
use futures::future;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::lines::lines;
use crate::modules::chat::ports::{
    GatewayConfig, GatewayError, GenerationRequest, ModelGateway, ReplyChunk, ReplyStream,
};

/// OpenAI API 请求格式
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

/// 流式响应格式
#[derive(Debug, Deserialize)]
struct OpenAIStreamResponse {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    error: Option<OpenAIErrorBody>,
}

#[derive(Debug, Deserialize)]
struct OpenAIStreamChoice {
    delta: OpenAIDelta,
}

#[derive(Debug, Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// OpenAI 兼容网关
pub struct OpenAIGateway {
    config: GatewayConfig,
    client: Client,
}

impl OpenAIGateway {
    /// 创建新的网关实例
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        // 只限制连接建立，流式回复的时长由空闲超时控制
        let client = Client::builder()
            .connect_timeout(config.idle_timeout())
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// 获取 API URL
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// 转换为 OpenAI 请求格式
    fn to_openai_request(&self, request: &GenerationRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.config.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role().to_openai_role(),
                    content: m.content().to_string(),
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: true,
        }
    }

    /// 解析 SSE 行，返回 `None` 表示该行不携带内容
    fn parse_sse_line(line: &str) -> Option<Result<ReplyChunk, GatewayError>> {
        let data = line.trim().strip_prefix("data:")?.trim_start();
        if data == "[DONE]" {
            return None;
        }

        let response = match serde_json::from_str::<OpenAIStreamResponse>(data) {
            Ok(response) => response,
            Err(e) => return Some(Err(GatewayError::InvalidResponse(e.to_string()))),
        };
        if let Some(err) = response.error {
            return Some(Err(GatewayError::Api {
                code: err
                    .code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "stream_error".to_string()),
                message: err.message,
            }));
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(|content| Ok(ReplyChunk::Delta(content)))
    }
}

#[async_trait]
impl ModelGateway for OpenAIGateway {
    fn name(&self) -> &str {
        "openai"
    }

    async fn stream_reply(&self, request: GenerationRequest) -> Result<ReplyStream, GatewayError> {
        let openai_request = self.to_openai_request(&request);

        debug!(
            "[OpenAIGateway] Sending streaming request: model={}, messages={}",
            self.config.model,
            openai_request.messages.len()
        );

        let mut builder = self
            .client
            .post(self.api_url("chat/completions"))
            .json(&openai_request);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let idle = self.config.idle_timeout();
        let response = tokio::time::timeout(idle, builder.send())
            .await
            .map_err(|_| {
                GatewayError::Network(format!("No response within {}s", idle.as_secs()))
            })?
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("[OpenAIGateway] API error: {} - {}", status, error_text);
            return Err(GatewayError::Api {
                code: status.as_str().to_string(),
                message: error_text,
            });
        }

        let stream = lines(response.bytes_stream(), idle).filter_map(|line| {
            future::ready(match line {
                Ok(line) => Self::parse_sse_line(&line),
                Err(e) => Some(Err(e)),
            })
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::Message;

    #[test]
    fn test_parse_content_delta() {
        let line = r#"data: {"id":"1","choices":[{"delta":{"content":"你好"},"finish_reason":null}]}"#;
        let chunk = OpenAIGateway::parse_sse_line(line).unwrap().unwrap();
        assert_eq!(chunk, ReplyChunk::Delta("你好".to_string()));
    }

    #[test]
    fn test_parse_skips_non_content_lines() {
        assert!(OpenAIGateway::parse_sse_line("").is_none());
        assert!(OpenAIGateway::parse_sse_line(": keep-alive").is_none());
        assert!(OpenAIGateway::parse_sse_line("data: [DONE]").is_none());
        assert!(OpenAIGateway::parse_sse_line(
            r#"data: {"choices":[{"delta":{"role":"assistant"},"finish_reason":null}]}"#
        )
        .is_none());
    }

    #[test]
    fn test_parse_garbled_data_is_an_error() {
        let result = OpenAIGateway::parse_sse_line("data: <html>Bad Gateway</html>").unwrap();
        assert!(matches!(result, Err(GatewayError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_stream_error() {
        let line = r#"data: {"error":{"message":"overloaded","code":503}}"#;
        let result = OpenAIGateway::parse_sse_line(line).unwrap();
        assert!(matches!(result, Err(GatewayError::Api { ref message, .. }) if message == "overloaded"));
    }

    #[test]
    fn test_request_format() {
        let gateway = OpenAIGateway::new(GatewayConfig {
            model: "test-model".to_string(),
            ..Default::default()
        })
        .unwrap();

        let request = GenerationRequest::new(vec![
            Message::new_system("be nice"),
            Message::new_user("hi"),
        ])
        .with_temperature(Some(0.3));

        let body = serde_json::to_value(gateway.to_openai_request(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "test-model",
                "messages": [
                    {"role": "system", "content": "be nice"},
                    {"role": "user", "content": "hi"}
                ],
                "temperature": 0.3_f32,
                "stream": true
            })
        );
    }
}
