// Ollama Gateway - Ollama Local LLM API
//
// 实现 Ollama 的 /api/chat 流式接口（NDJSON）

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

/// Ollama 聊天请求
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama 流式响应的一行
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Ollama 网关
pub struct OllamaGateway {
    config: GatewayConfig,
    client: Client,
}

impl OllamaGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        // 只限制连接建立，流式回复的时长由空闲超时控制
        let client = Client::builder()
            .connect_timeout(config.idle_timeout())
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn to_ollama_request(&self, request: &GenerationRequest) -> OllamaChatRequest {
        let options = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            })
        } else {
            None
        };

        OllamaChatRequest {
            model: self.config.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role().to_openai_role().to_string(),
                    content: m.content().to_string(),
                })
                .collect(),
            stream: true,
            options,
        }
    }

    /// 解析一行 NDJSON
    fn parse_line(line: &str) -> Option<Result<ReplyChunk, GatewayError>> {
        if line.trim().is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<OllamaChatResponse>(line) {
            Ok(response) => response,
            Err(e) => return Some(Err(GatewayError::InvalidResponse(e.to_string()))),
        };

        if let Some(message) = response.error {
            return Some(Err(GatewayError::Api {
                code: "ollama".to_string(),
                message,
            }));
        }

        // 最后一行只包含统计信息
        if response.done {
            return None;
        }

        response
            .message
            .map(|m| m.content)
            .filter(|content| !content.is_empty())
            .map(|content| Ok(ReplyChunk::Delta(content)))
    }
}

#[async_trait]
impl ModelGateway for OllamaGateway {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn stream_reply(&self, request: GenerationRequest) -> Result<ReplyStream, GatewayError> {
        let ollama_request = self.to_ollama_request(&request);

        debug!(
            "[OllamaGateway] Sending streaming request: model={}, messages={}",
            self.config.model,
            ollama_request.messages.len()
        );

        let builder = self
            .client
            .post(format!(
                "{}/api/chat",
                self.config.base_url.trim_end_matches('/')
            ))
            .json(&ollama_request);

        let idle = self.config.idle_timeout();
        let response = tokio::time::timeout(idle, builder.send())
            .await
            .map_err(|_| {
                GatewayError::Network(format!("No response within {}s", idle.as_secs()))
            })?
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("[OllamaGateway] API error: {} - {}", status, error_text);
            return Err(GatewayError::Api {
                code: status.as_str().to_string(),
                message: error_text,
            });
        }

        let stream = lines(response.bytes_stream(), idle).filter_map(|line| {
            future::ready(match line {
                Ok(line) => Self::parse_line(&line),
                Err(e) => Some(Err(e)),
            })
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_line() {
        let line = r#"{"model":"qwen2.5","message":{"role":"assistant","content":"Hi"},"done":false}"#;
        let chunk = OllamaGateway::parse_line(line).unwrap().unwrap();
        assert_eq!(chunk, ReplyChunk::Delta("Hi".to_string()));
    }

    #[test]
    fn test_parse_final_line() {
        let line = r#"{"model":"qwen2.5","message":{"role":"assistant","content":""},"done":true,"eval_count":12}"#;
        assert!(OllamaGateway::parse_line(line).is_none());
    }

    #[test]
    fn test_parse_error_line() {
        let result = OllamaGateway::parse_line(r#"{"error":"model not found"}"#).unwrap();
        assert!(matches!(result, Err(GatewayError::Api { .. })));

        let garbage = OllamaGateway::parse_line("not json").unwrap();
        assert!(matches!(garbage, Err(GatewayError::InvalidResponse(_))));
    }

    #[test]
    fn test_options_only_when_set() {
        let gateway = OllamaGateway::new(GatewayConfig::default()).unwrap();
        let request = GenerationRequest::new(Vec::new());
        assert!(gateway.to_ollama_request(&request).options.is_none());

        let request = request.with_max_tokens(Some(256));
        let options = gateway.to_ollama_request(&request).options.unwrap();
        assert_eq!(options.num_predict, Some(256));
    }
}
