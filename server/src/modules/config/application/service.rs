// Config Service
//
// 配置服务门面，提供统一的 API

use std::sync::Arc;
use tracing::info;

use crate::modules::config::domain::{ApiKey, AppConfig};
use crate::modules::config::ports::{ConfigError, ConfigRepository};

/// 覆盖 `model.apiKey` 的环境变量
pub const API_KEY_ENV: &str = "WEBCHAT_API_KEY";

/// 配置服务实现
pub struct ConfigService {
    repository: Arc<dyn ConfigRepository>,
}

impl ConfigService {
    pub fn new(repository: Arc<dyn ConfigRepository>) -> Self {
        Self { repository }
    }

    /// 获取仓储引用
    pub fn repository(&self) -> &Arc<dyn ConfigRepository> {
        &self.repository
    }

    /// 加载配置，应用环境变量覆盖并校验
    pub async fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with_env(|name| std::env::var(name).ok()).await
    }

    /// 同 [`load`](Self::load)，环境变量从 `lookup` 读取
    pub async fn load_with_env<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String> + Send,
    {
        let mut config = self.repository.load().await?;

        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            info!("[Config] Using API key from {}", API_KEY_ENV);
            config.model.api_key = ApiKey::new(key);
        }

        config
            .validate()
            .map_err(|errors| ConfigError::ValidationError { errors })?;

        Ok(config)
    }

    /// 写入默认配置，已存在时返回 `false` 且不覆盖
    pub async fn init(&self) -> Result<bool, ConfigError> {
        if self.repository.exists().await? {
            return Ok(false);
        }
        self.repository.save(&AppConfig::default()).await?;
        Ok(true)
    }
}
