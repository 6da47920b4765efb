// Model Gateway Adapters
// 各种模型服务的网关实现

mod echo;
mod factory;
mod lines;
mod ollama;
mod openai;
mod scripted;

pub use echo::*;
pub use factory::*;
pub use ollama::*;
pub use openai::*;
pub use scripted::*;
