use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::super::{ApplicationError, CommandHandler, SharedSession};
use crate::modules::chat::domain::{ContextBuilder, ConversationId, Message};
use crate::modules::chat::ports::{ConversationStore, GenerationRequest, ModelGateway};

/// 事件通道容量
const EVENT_BUFFER: usize = 32;

/// 发送消息命令
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    /// 目标会话
    pub session: SharedSession,
    /// 用户消息内容
    pub content: String,
}

impl SendMessageCommand {
    pub fn new(session: SharedSession, content: impl Into<String>) -> Self {
        Self {
            session,
            content: content.into(),
        }
    }
}

/// 发送消息响应（流式）
#[derive(Debug, Clone)]
pub struct SendMessageResponse {
    /// 已追加到会话的用户消息
    pub user_message: Message,
    /// 本轮所属的对话
    pub conversation_id: ConversationId,
}

/// 一轮对话完成后的结果（非流式）
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub conversation_id: ConversationId,
    pub saved: bool,
}

/// 流式响应事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// 回复片段，同时给出增量和累计内容，由调用方选择渲染方式
    Delta { delta: String, snapshot: String },
    /// 完成，回复已追加到会话
    Done {
        content: String,
        conversation_id: ConversationId,
        saved: bool,
    },
    /// 错误，本轮结束
    Error(String),
    /// 会话在生成期间被重置，回复已丢弃
    Discarded,
}

/// 生成参数
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// 发送消息命令处理器
pub struct SendMessageHandler {
    store: Arc<dyn ConversationStore>,
    gateway: Arc<dyn ModelGateway>,
    context_builder: ContextBuilder,
    options: GenerationOptions,
}

impl SendMessageHandler {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        gateway: Arc<dyn ModelGateway>,
        context_builder: ContextBuilder,
        options: GenerationOptions,
    ) -> Self {
        Self {
            store,
            gateway,
            context_builder,
            options,
        }
    }

    /// 处理流式响应
    ///
    /// 用户消息立即追加到会话；回复在后台任务中生成并通过通道推送。
    /// 接收端被丢弃视为放弃本轮：不追加回复，也不保存。
    pub async fn handle_stream(
        &self,
        command: SendMessageCommand,
    ) -> Result<(SendMessageResponse, mpsc::Receiver<TurnEvent>), ApplicationError> {
        // 验证输入
        if command.content.trim().is_empty() {
            return Err(ApplicationError::ValidationError(
                "Message content cannot be empty".to_string(),
            ));
        }

        let user_message = Message::new_user(&command.content);

        // 追加用户消息并记录当前版本
        let (user, history, revision, conversation_id) = {
            let mut session = command.session.lock().await;
            session.append(user_message.clone())?;
            let conversation_id = session.conversation_id().cloned().ok_or_else(|| {
                ApplicationError::InternalError("Conversation missing after append".to_string())
            })?;
            (
                session.user().clone(),
                session.messages().to_vec(),
                session.revision(),
                conversation_id,
            )
        };

        // 构建上下文
        let request = GenerationRequest::new(self.context_builder.build(&history))
            .with_max_tokens(self.options.max_tokens)
            .with_temperature(self.options.temperature);

        debug!(
            "[SendMessage] Starting turn: user={}, conversation={}, history={}",
            user,
            conversation_id,
            history.len()
        );

        // 创建响应通道
        let (tx, rx) = mpsc::channel::<TurnEvent>(EVENT_BUFFER);

        let gateway = self.gateway.clone();
        let store = self.store.clone();
        let session = command.session.clone();
        let turn_conversation = conversation_id.clone();

        tokio::spawn(async move {
            let mut stream = match gateway.stream_reply(request).await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!("[SendMessage] Gateway {} refused: {}", gateway.name(), e);
                    let _ = tx.send(TurnEvent::Error(e.to_string())).await;
                    return;
                }
            };

            let mut reply = String::new();
            while let Some(chunk_result) = stream.next().await {
                match chunk_result {
                    Ok(chunk) => {
                        let delta = chunk.apply(&mut reply);
                        let event = TurnEvent::Delta {
                            delta,
                            snapshot: reply.clone(),
                        };
                        if tx.send(event).await.is_err() {
                            info!("[SendMessage] Client went away, abandoning turn");
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("[SendMessage] Reply stream failed: {}", e);
                        let _ = tx.send(TurnEvent::Error(e.to_string())).await;
                        return;
                    }
                }
            }

            if tx.is_closed() {
                info!("[SendMessage] Client went away, abandoning turn");
                return;
            }

            // 没有产出任何文本的回复不算完成
            if reply.is_empty() {
                warn!("[SendMessage] Gateway {} produced an empty reply", gateway.name());
                let _ = tx
                    .send(TurnEvent::Error("Model returned an empty reply".to_string()))
                    .await;
                return;
            }

            // 追加助手回复
            let conversation = {
                let mut session = session.lock().await;
                if session.revision() != revision {
                    info!("[SendMessage] Session reset during turn, discarding reply");
                    let _ = tx.send(TurnEvent::Discarded).await;
                    return;
                }
                if let Err(e) = session.append(Message::new_assistant(&reply)) {
                    let _ = tx.send(TurnEvent::Error(e.to_string())).await;
                    return;
                }
                session.conversation().cloned()
            };

            // 保存完整对话
            let saved = match conversation {
                Some(conversation) => match store.save_conversation(&user, &conversation).await {
                    Ok(saved) => saved,
                    Err(e) => {
                        error!(
                            "[SendMessage] Failed to save conversation {}: {}",
                            turn_conversation, e
                        );
                        let _ = tx
                            .send(TurnEvent::Error(format!(
                                "Failed to save conversation: {}",
                                e
                            )))
                            .await;
                        return;
                    }
                },
                None => false,
            };

            // 发送完成事件
            let _ = tx
                .send(TurnEvent::Done {
                    content: reply,
                    conversation_id: turn_conversation,
                    saved,
                })
                .await;
        });

        Ok((
            SendMessageResponse {
                user_message,
                conversation_id,
            },
            rx,
        ))
    }
}

#[async_trait]
impl CommandHandler<SendMessageCommand, TurnOutcome> for SendMessageHandler {
    async fn handle(&self, command: SendMessageCommand) -> Result<TurnOutcome, ApplicationError> {
        let (_, mut rx) = self.handle_stream(command).await?;

        // 非流式：等待完整回复
        while let Some(event) = rx.recv().await {
            match event {
                TurnEvent::Delta { .. } => {}
                TurnEvent::Done {
                    content,
                    conversation_id,
                    saved,
                } => {
                    return Ok(TurnOutcome {
                        reply: content,
                        conversation_id,
                        saved,
                    })
                }
                TurnEvent::Error(message) => return Err(ApplicationError::TurnFailed(message)),
                TurnEvent::Discarded => return Err(ApplicationError::TurnDiscarded),
            }
        }

        Err(ApplicationError::InternalError(
            "Turn ended without a result".to_string(),
        ))
    }
}
