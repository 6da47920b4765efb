use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::modules::config::{AppConfig, DEFAULT_CONFIG_FILE};

#[derive(Debug, Parser)]
#[command(name = "webchat")]
#[command(about = "Browser chat front-end for a pretrained LLM with per-user history")]
#[command(version)]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server (default)
    Serve(ServeArgs),
    /// Write a default config file
    InitConfig,
}

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory holding users/<user>/ conversation files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl ServeArgs {
    /// 命令行参数覆盖配置文件
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref data_dir) = self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
    }
}
