use std::sync::Arc;
use tracing::info;

use super::{EchoGateway, OllamaGateway, OpenAIGateway};
use crate::modules::chat::ports::{GatewayConfig, GatewayError, ModelGateway, ProviderType};

/// 根据配置创建模型网关
pub fn create_gateway(config: &GatewayConfig) -> Result<Arc<dyn ModelGateway>, GatewayError> {
    let gateway: Arc<dyn ModelGateway> = match config.provider_type {
        ProviderType::OpenAI => Arc::new(OpenAIGateway::new(config.clone())?),
        ProviderType::Ollama => Arc::new(OllamaGateway::new(config.clone())?),
        ProviderType::Echo => Arc::new(EchoGateway::new()),
    };

    info!(
        "[ModelGateway] Using {} gateway: model={}",
        gateway.name(),
        config.model
    );

    Ok(gateway)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_by_provider() {
        let mut config = GatewayConfig::default();
        assert_eq!(create_gateway(&config).unwrap().name(), "openai");

        config.provider_type = ProviderType::Ollama;
        assert_eq!(create_gateway(&config).unwrap().name(), "ollama");

        config.provider_type = ProviderType::Echo;
        assert_eq!(create_gateway(&config).unwrap().name(), "echo");
    }
}
