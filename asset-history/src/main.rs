use anyhow::Result;
use asset_history::cli::{run, Cli};
use clap::Parser;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment (ROBLOSECURITY may come from .env)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI arguments parsed, invoking run");

    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
