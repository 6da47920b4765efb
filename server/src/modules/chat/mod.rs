// Chat Module - 聊天模块
//
// 实现六边形架构（Hexagonal Architecture）：
// - domain: 领域层，包含实体、值对象和领域服务
// - ports: 端口层，定义会话存储和模型网关的抽象接口
// - infrastructure: 基础设施层，实现端口的具体适配器
// - application: 应用层，实现 CQRS 命令和查询处理器

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// 重新导出常用类型
pub use application::{
    // Traits
    ApplicationError,
    CommandHandler,
    // Commands
    DeleteConversationCommand,
    DeleteConversationHandler,
    GenerationOptions,
    OpenSessionCommand,
    OpenSessionHandler,
    OpenSessionResponse,
    ResetMode,
    ResetSessionCommand,
    ResetSessionHandler,
    SelectConversationCommand,
    SelectConversationHandler,
    SendMessageCommand,
    SendMessageHandler,
    SendMessageResponse,
    SharedSession,
    TurnEvent,
    TurnOutcome,
    // Queries
    GetSessionViewHandler,
    GetSessionViewQuery,
    ListConversationsHandler,
    ListConversationsQuery,
    QueryHandler,
    SessionView,
};

pub use domain::{
    ChatSession, ContextBuilder, Conversation, ConversationId, ConversationSummary,
    IdentityScheme, InvalidIdentity, Message, MessageRole, SessionState, UserId,
};

pub use infrastructure::{
    create_gateway, EchoGateway, FileConversationStore, InMemoryConversationStore, OllamaGateway,
    OpenAIGateway, ScriptedGateway,
};

pub use ports::{
    ConversationStore, GatewayConfig, GatewayError, GenerationRequest, ModelGateway, ProviderType,
    ReplyChunk, ReplyStream, StoreError,
};

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Chat 模块容器
///
/// 管理模块内的依赖注入
pub struct ChatModule {
    // Ports
    gateway: Arc<dyn ModelGateway>,
    // Handlers
    open_session_handler: OpenSessionHandler,
    reset_session_handler: ResetSessionHandler,
    select_conversation_handler: SelectConversationHandler,
    delete_conversation_handler: DeleteConversationHandler,
    send_message_handler: SendMessageHandler,
    list_conversations_handler: ListConversationsHandler,
    get_session_view_handler: GetSessionViewHandler,
}

impl ChatModule {
    /// 创建带持久化存储的 ChatModule 实例（生产环境推荐）
    ///
    /// # Arguments
    /// * `data_dir` - 数据目录，对话保存在 `data_dir/users/<user>/` 下
    /// * `scheme` - 对话标识的生成方式
    ///
    /// # Errors
    /// 如果无法初始化文件存储，返回错误
    pub async fn new_with_persistence(
        data_dir: PathBuf,
        scheme: IdentityScheme,
        gateway: Arc<dyn ModelGateway>,
        context_builder: ContextBuilder,
        options: GenerationOptions,
    ) -> Result<Self, StoreError> {
        let store: Arc<dyn ConversationStore> =
            Arc::new(FileConversationStore::new(data_dir, scheme).await?);

        Ok(Self::with_store(
            store,
            gateway,
            scheme,
            context_builder,
            options,
        ))
    }

    /// 使用自定义存储创建 ChatModule
    pub fn with_store(
        store: Arc<dyn ConversationStore>,
        gateway: Arc<dyn ModelGateway>,
        scheme: IdentityScheme,
        context_builder: ContextBuilder,
        options: GenerationOptions,
    ) -> Self {
        let open_session_handler = OpenSessionHandler::new(store.clone(), scheme);
        let reset_session_handler = ResetSessionHandler::new();
        let select_conversation_handler = SelectConversationHandler::new(store.clone());
        let delete_conversation_handler = DeleteConversationHandler::new(store.clone());
        let send_message_handler =
            SendMessageHandler::new(store.clone(), gateway.clone(), context_builder, options);
        let list_conversations_handler = ListConversationsHandler::new(store.clone());
        let get_session_view_handler = GetSessionViewHandler::new();

        Self {
            gateway,
            open_session_handler,
            reset_session_handler,
            select_conversation_handler,
            delete_conversation_handler,
            send_message_handler,
            list_conversations_handler,
            get_session_view_handler,
        }
    }

    // Command handlers

    /// 为用户打开新会话
    pub async fn open_session(
        &self,
        command: OpenSessionCommand,
    ) -> Result<OpenSessionResponse, ApplicationError> {
        self.open_session_handler.handle(command).await
    }

    /// 开始新对话或清空当前对话
    pub async fn reset_session(
        &self,
        command: ResetSessionCommand,
    ) -> Result<SessionState, ApplicationError> {
        self.reset_session_handler.handle(command).await
    }

    /// 载入已保存的对话
    pub async fn select_conversation(
        &self,
        command: SelectConversationCommand,
    ) -> Result<SessionState, ApplicationError> {
        self.select_conversation_handler.handle(command).await
    }

    /// 删除已保存的对话
    pub async fn delete_conversation(
        &self,
        command: DeleteConversationCommand,
    ) -> Result<(), ApplicationError> {
        self.delete_conversation_handler.handle(command).await
    }

    /// 发送消息（等待完整回复）
    pub async fn send_message(
        &self,
        command: SendMessageCommand,
    ) -> Result<TurnOutcome, ApplicationError> {
        self.send_message_handler.handle(command).await
    }

    /// 发送消息（流式）
    pub async fn send_message_stream(
        &self,
        command: SendMessageCommand,
    ) -> Result<(SendMessageResponse, mpsc::Receiver<TurnEvent>), ApplicationError> {
        self.send_message_handler.handle_stream(command).await
    }

    // Query handlers

    /// 列出用户已保存的对话
    pub async fn list_conversations(
        &self,
        query: ListConversationsQuery,
    ) -> Result<Vec<ConversationSummary>, ApplicationError> {
        self.list_conversations_handler.handle(query).await
    }

    /// 获取会话视图
    pub async fn session_view(
        &self,
        query: GetSessionViewQuery,
    ) -> Result<SessionView, ApplicationError> {
        self.get_session_view_handler.handle(query).await
    }

    // Accessors

    /// 获取模型网关
    pub fn gateway(&self) -> &Arc<dyn ModelGateway> {
        &self.gateway
    }
}
