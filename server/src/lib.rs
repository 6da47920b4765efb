pub mod cli;
pub mod handlers;
pub mod infrastructure;
pub mod modules;
pub mod server;
pub mod shared;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ServeArgs};
use modules::ConfigModule;

/// 初始化日志，`RUST_LOG` 未设置时默认 info
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_module = ConfigModule::new_with_file(&cli.config);

    match cli.command {
        Some(Command::InitConfig) => {
            if config_module.init().await? {
                tracing::info!("Wrote default config to {}", cli.config.display());
            } else {
                tracing::warn!(
                    "{} already exists, leaving it untouched",
                    cli.config.display()
                );
            }
            Ok(())
        }
        command => {
            let args = match command {
                Some(Command::Serve(args)) => args,
                _ => ServeArgs::default(),
            };

            let mut config = config_module
                .load()
                .await
                .with_context(|| format!("Failed to load config {}", cli.config.display()))?;
            args.apply(&mut config);
            config
                .validate()
                .map_err(|errors| anyhow::anyhow!("Invalid configuration: {}", errors.join("; ")))?;

            tracing::info!(
                "Webchat starting: provider={:?}, model={}, data_dir={}",
                config.model.provider,
                config.model.model,
                config.storage.data_dir.display()
            );

            server::run_server(config).await
        }
    }
}
