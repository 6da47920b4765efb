// Server Infrastructure
//
// HTTP 层共享的状态：会话注册表、客户端身份识别

mod client_identity;
mod session_registry;
mod state;

pub use client_identity::*;
pub use session_registry::*;
pub use state::*;
