// Chat Queries - 查询定义和处理器

mod get_session_view;
mod list_conversations;

pub use get_session_view::*;
pub use list_conversations::*;
