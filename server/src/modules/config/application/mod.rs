// Config Application Layer
//
// 配置加载、环境变量覆盖和校验

mod service;

pub use service::*;
