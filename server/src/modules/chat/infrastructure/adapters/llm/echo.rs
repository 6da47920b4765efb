// 回显网关
//
// 未配置真实模型服务时使用，把最后一条用户消息以累计快照的形式流式返回

use async_trait::async_trait;
use futures::stream;

use crate::modules::chat::domain::MessageRole;
use crate::modules::chat::ports::{
    GatewayError, GenerationRequest, ModelGateway, ReplyChunk, ReplyStream,
};

/// 每个快照新增的字符数
const CHARS_PER_STEP: usize = 4;

#[derive(Debug, Default)]
pub struct EchoGateway;

impl EchoGateway {
    pub fn new() -> Self {
        Self
    }

    fn reply_for(request: &GenerationRequest) -> String {
        let user_content = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role() == MessageRole::User)
            .map(|m| m.content())
            .unwrap_or("");

        format!("You said: {}", user_content)
    }
}

#[async_trait]
impl ModelGateway for EchoGateway {
    fn name(&self) -> &str {
        "echo"
    }

    async fn stream_reply(&self, request: GenerationRequest) -> Result<ReplyStream, GatewayError> {
        let reply: Vec<char> = Self::reply_for(&request).chars().collect();

        let snapshots: Vec<Result<ReplyChunk, GatewayError>> = (1..=reply.len())
            .step_by(CHARS_PER_STEP)
            .map(|end| reply[..end].iter().collect::<String>())
            .chain(std::iter::once(reply.iter().collect::<String>()))
            .map(|snapshot| Ok(ReplyChunk::Snapshot(snapshot)))
            .collect();

        Ok(Box::pin(stream::iter(snapshots)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::domain::Message;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_echo_snapshots() {
        let gateway = EchoGateway::new();
        let request = GenerationRequest::new(vec![
            Message::new_system("ignored"),
            Message::new_user("你好"),
        ]);

        let chunks: Vec<ReplyChunk> = gateway
            .stream_reply(request)
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;

        let mut reply = String::new();
        for chunk in chunks.clone() {
            chunk.apply(&mut reply);
        }
        assert_eq!(reply, "You said: 你好");
        assert!(chunks.len() > 1);
    }
}
