// Chat Application Layer - 应用层
// 实现 CQRS 模式的命令和查询处理器

pub mod commands;
pub mod queries;

// 导出命令和查询
pub use commands::*;
pub use queries::*;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use super::domain::{ChatSession, InvalidIdentity};
use super::ports::{GatewayError, StoreError};

/// 一个浏览器会话的聊天状态，状态迁移时加锁，生成回复期间不持有锁
pub type SharedSession = Arc<Mutex<ChatSession>>;

/// 应用层错误类型
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error(transparent)]
    InvalidIdentity(#[from] InvalidIdentity),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Turn failed: {0}")]
    TurnFailed(String),

    #[error("Turn discarded: the session was reset while the reply was streaming")]
    TurnDiscarded,

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// 命令处理器 trait
///
/// 遵循 CQRS 模式，命令处理器负责执行有副作用的操作
#[async_trait]
pub trait CommandHandler<C, R>: Send + Sync
where
    C: Send + Sync,
{
    /// 执行命令
    async fn handle(&self, command: C) -> Result<R, ApplicationError>;
}

/// 查询处理器 trait
///
/// 遵循 CQRS 模式，查询处理器负责只读操作
#[async_trait]
pub trait QueryHandler<Q, R>: Send + Sync
where
    Q: Send + Sync,
{
    /// 执行查询
    async fn handle(&self, query: Q) -> Result<R, ApplicationError>;
}
