// Chat Infrastructure - Repositories
//
// 存储实现：
// - InMemoryConversationStore: 内存存储，用于开发和测试
// - FileConversationStore: 每个会话一个文件，用于生产环境

mod file_conversation_store;
mod in_memory_conversation_store;

pub use file_conversation_store::*;
pub use in_memory_conversation_store::*;
