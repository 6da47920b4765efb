// File Config Repository
//
// 基于 JSON 文件的配置仓储实现

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::modules::config::domain::AppConfig;
use crate::modules::config::ports::{ConfigError, ConfigRepository};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "webchat.json";

/// JSON 文件配置仓储
pub struct FileConfigRepository {
    /// 配置文件路径
    config_path: PathBuf,
}

impl FileConfigRepository {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

#[async_trait]
impl ConfigRepository for FileConfigRepository {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        if !tokio::fs::try_exists(&self.config_path).await? {
            debug!(
                "[Config] {} not found, using defaults",
                self.config_path.display()
            );
            return Ok(AppConfig::default());
        }

        let content = tokio::fs::read_to_string(&self.config_path).await?;
        let config: AppConfig = serde_json::from_str(&content)?;

        Ok(config)
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        // 确保目录存在
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.config_path, content).await?;

        Ok(())
    }

    async fn exists(&self) -> Result<bool, ConfigError> {
        Ok(tokio::fs::try_exists(&self.config_path).await?)
    }
}
