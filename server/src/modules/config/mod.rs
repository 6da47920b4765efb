// Config Module
//
// 配置管理模块，采用六边形架构
//
// 层次结构:
// - domain: 领域层，包含配置实体和值对象
// - ports: 端口层，定义配置读写的抽象接口
// - infrastructure: 基础设施层，实现具体的配置存储适配器
// - application: 应用层，加载、覆盖并校验配置

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// 重新导出常用类型

// Domain
pub use domain::{ApiKey, AppConfig, ModelConfig, ServerConfig, StorageConfig, UiConfig};

// Ports
pub use ports::{ConfigError, ConfigRepository};

// Infrastructure
pub use infrastructure::{FileConfigRepository, InMemoryConfigRepository, DEFAULT_CONFIG_FILE};

// Application
pub use application::{ConfigService, API_KEY_ENV};

use std::path::PathBuf;
use std::sync::Arc;

/// Config 模块容器
///
/// 管理模块内的依赖注入
pub struct ConfigModule {
    service: ConfigService,
}

impl ConfigModule {
    /// 使用内存仓储创建（用于测试）
    pub fn new_in_memory() -> Self {
        Self::with_repository(Arc::new(InMemoryConfigRepository::new()))
    }

    /// 使用 JSON 文件创建
    pub fn new_with_file(config_path: impl Into<PathBuf>) -> Self {
        Self::with_repository(Arc::new(FileConfigRepository::new(config_path)))
    }

    /// 使用自定义仓储创建
    pub fn with_repository(repository: Arc<dyn ConfigRepository>) -> Self {
        Self {
            service: ConfigService::new(repository),
        }
    }

    /// 获取配置服务
    pub fn service(&self) -> &ConfigService {
        &self.service
    }

    /// 加载并校验配置
    pub async fn load(&self) -> Result<AppConfig, ConfigError> {
        self.service.load().await
    }

    /// 写入默认配置文件
    pub async fn init(&self) -> Result<bool, ConfigError> {
        self.service.init().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_module_integration() {
        let temp_dir = TempDir::new().unwrap();
        let module = ConfigModule::new_with_file(temp_dir.path().join(DEFAULT_CONFIG_FILE));

        // 写入默认配置
        assert!(module.init().await.unwrap());

        // 读回
        let config = module.service().load_with_env(|_| None).await.unwrap();
        assert_eq!(config.server.port, ServerConfig::default().port);
        assert_eq!(config.ui.greeting, UiConfig::default().greeting);
    }
}
