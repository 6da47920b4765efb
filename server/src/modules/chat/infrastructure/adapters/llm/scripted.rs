// 脚本网关
//
// 按预设脚本输出回复片段，可模拟中途失败或在结束前等待外部信号，
// 用于测试和演示

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use futures::future;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

use crate::modules::chat::ports::{
    GatewayError, GenerationRequest, ModelGateway, ReplyChunk, ReplyStream,
};

#[derive(Default)]
pub struct ScriptedGateway {
    chunks: Vec<ReplyChunk>,
    /// 输出完全部片段后返回的错误
    failure: Option<String>,
    /// 打开流时直接返回的错误
    refusal: Option<String>,
    /// 输出完全部片段后等待该信号再结束
    gate: Option<Arc<Notify>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGateway {
    pub fn new(chunks: Vec<ReplyChunk>) -> Self {
        Self {
            chunks,
            ..Default::default()
        }
    }

    /// 以累计快照输出
    pub fn snapshots(snapshots: &[&str]) -> Self {
        Self::new(
            snapshots
                .iter()
                .map(|s| ReplyChunk::Snapshot(s.to_string()))
                .collect(),
        )
    }

    /// 以增量文本输出
    pub fn deltas(deltas: &[&str]) -> Self {
        Self::new(
            deltas
                .iter()
                .map(|s| ReplyChunk::Delta(s.to_string()))
                .collect(),
        )
    }

    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn refusing_with(mut self, message: impl Into<String>) -> Self {
        self.refusal = Some(message.into());
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// 已收到的请求
    pub async fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_reply(&self, request: GenerationRequest) -> Result<ReplyStream, GatewayError> {
        self.requests.lock().await.push(request);

        if let Some(message) = &self.refusal {
            return Err(GatewayError::Unavailable(message.clone()));
        }

        let mut reply: ReplyStream = Box::pin(stream::iter(self.chunks.clone().into_iter().map(Ok)));

        if let Some(gate) = self.gate.clone() {
            let wait = stream::once(async move { gate.notified().await })
                .filter_map(|()| future::ready(None));
            reply = Box::pin(reply.chain(wait));
        }

        if let Some(message) = self.failure.clone() {
            let failure = stream::once(future::ready(Err(GatewayError::Network(message))));
            reply = Box::pin(reply.chain(failure));
        }

        Ok(reply)
    }
}
