// Chat Domain - Entities
// 实体通过唯一标识符来识别

mod chat_session;
mod conversation;
mod message;

pub use chat_session::*;
pub use conversation::*;
pub use message::*;
