use clap::Parser;

use webchat_lib::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    webchat_lib::init_tracing();

    let cli = Cli::parse();
    webchat_lib::run(cli).await
}
