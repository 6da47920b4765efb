// Config Domain Entities
//
// 配置领域实体定义

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::value_objects::ApiKey;
use crate::modules::chat::{
    ContextBuilder, GatewayConfig, GenerationOptions, IdentityScheme, ProviderType, UserId,
};

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 是否信任反向代理传入的 X-Forwarded-For
    pub trust_forwarded_for: bool,
    /// 会话上下文闲置多久后回收（秒）
    pub session_idle_secs: u64,
}

impl ServerConfig {
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            trust_forwarded_for: false,
            session_idle_secs: 1800,
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// 无法识别客户端地址时使用的用户
    pub default_user: String,
    pub identity_scheme: IdentityScheme,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            default_user: "anonymous".to_string(),
            identity_scheme: IdentityScheme::default(),
        }
    }
}

/// 模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    pub provider: ProviderType,
    pub base_url: String,
    pub api_key: ApiKey,
    pub model: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let gateway = GatewayConfig::default();
        Self {
            provider: gateway.provider_type,
            base_url: gateway.base_url,
            api_key: ApiKey::default(),
            model: gateway.model,
            timeout_secs: gateway.timeout_secs,
            temperature: None,
            max_tokens: None,
            system_prompt: None,
        }
    }
}

impl ModelConfig {
    /// 转换为模型网关配置
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            provider_type: self.provider,
            base_url: self.base_url.clone(),
            api_key: self.api_key.expose().to_string(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    pub fn context_builder(&self) -> ContextBuilder {
        match self.system_prompt {
            Some(ref prompt) => ContextBuilder::new().with_system_prompt(prompt.clone()),
            None => ContextBuilder::new(),
        }
    }
}

/// 页面配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiConfig {
    pub title: String,
    /// 空会话时显示的欢迎语
    pub greeting: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "Baichuan 13B Chat".to_string(),
            greeting: "您好，我是百川大模型，很高兴为您服务🥰".to_string(),
        }
    }
}

/// 应用配置聚合根
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub model: ModelConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// 创建新的默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 默认用户
    pub fn default_user(&self) -> Result<UserId, String> {
        UserId::parse(&self.storage.default_user).map_err(|e| e.to_string())
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("Server port must not be 0".to_string());
        }

        if self.server.session_idle_secs == 0 {
            errors.push("Session idle timeout must be positive".to_string());
        }

        if self.storage.data_dir.as_os_str().is_empty() {
            errors.push("Storage data directory must not be empty".to_string());
        }

        if let Err(e) = self.default_user() {
            errors.push(format!("Invalid default user: {}", e));
        }

        if self.model.provider != ProviderType::Echo && self.model.base_url.trim().is_empty() {
            errors.push("Model base URL is required for remote providers".to_string());
        }

        if self.model.model.trim().is_empty() {
            errors.push("Model name must not be empty".to_string());
        }

        if let Some(temperature) = self.model.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                errors.push("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.storage.default_user, "anonymous");
        assert_eq!(config.storage.identity_scheme, IdentityScheme::Generated);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"server": {"port": 9000}, "storage": {"identityScheme": "first_message"}}"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.session_idle_secs, 1800);
        assert_eq!(config.storage.identity_scheme, IdentityScheme::FirstMessage);
        assert_eq!(config.ui.title, UiConfig::default().title);
    }

    #[test]
    fn test_app_config_validate() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.server.session_idle_secs = 0;
        config.storage.default_user = "../etc".to_string();
        config.model.base_url = String::new();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);

        // 回显网关不需要地址
        let mut config = AppConfig::default();
        config.model.provider = ProviderType::Echo;
        config.model.base_url = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_model_config_conversion() {
        let model = ModelConfig {
            api_key: ApiKey::new("sk-test"),
            temperature: Some(0.5),
            system_prompt: Some("Be brief.".to_string()),
            ..Default::default()
        };

        let gateway = model.gateway_config();
        assert_eq!(gateway.api_key, "sk-test");
        assert_eq!(gateway.model, "Baichuan-13B-Chat");
        assert_eq!(model.generation_options().temperature, Some(0.5));
        assert_eq!(model.context_builder().build(&[]).len(), 1);
    }
}
