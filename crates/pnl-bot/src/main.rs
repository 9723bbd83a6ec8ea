//! Daily PnL summary bot - Entry Point

use anyhow::Result;
use clap::Parser;
use pnl_bot::AppConfig;
use std::path::Path;
use tracing::info;

/// Daily PnL summary bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PNL_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it carries the log filter
    let config_path = AppConfig::resolve_path(args.config);
    let config = AppConfig::load(&config_path)?;

    pnl_telemetry::init_logging(&config.telemetry.log_level)?;

    info!("Starting PnL bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        found = Path::new(&config_path).exists(),
        default_timezone = %config.schedule.default_timezone,
        "Configuration loaded"
    );

    let app = pnl_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
