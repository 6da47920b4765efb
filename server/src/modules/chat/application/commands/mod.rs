// Chat Commands - 命令定义和处理器

mod delete_conversation;
mod open_session;
mod reset_session;
mod select_conversation;
mod send_message;

pub use delete_conversation::*;
pub use open_session::*;
pub use reset_session::*;
pub use select_conversation::*;
pub use send_message::*;
