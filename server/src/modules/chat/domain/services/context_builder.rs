use super::super::entities::Message;

/// 上下文构建器
///
/// 领域服务：构建发送给模型的消息历史
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    /// 系统提示词
    system_prompt: Option<String>,
}

impl ContextBuilder {
    /// 创建上下文构建器（发送完整历史）
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置系统提示词
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        if !prompt.trim().is_empty() {
            self.system_prompt = Some(prompt);
        }
        self
    }

    /// 构建上下文消息列表
    ///
    /// 返回：
    /// 1. 系统提示词（如果有）
    /// 2. 完整的对话历史，最后一条是最新的用户消息
    pub fn build(&self, history: &[Message]) -> Vec<Message> {
        let mut context = Vec::with_capacity(history.len() + 1);
        if let Some(ref prompt) = self.system_prompt {
            context.push(Message::new_system(prompt.clone()));
        }
        context.extend_from_slice(history);
        context
    }
}
