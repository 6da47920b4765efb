// Chat Infrastructure - Adapters
// 外部服务的适配器实现

pub mod llm;
