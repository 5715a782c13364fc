//! FoundIt Backend Entry Point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use foundit_lib::config::Config;
use rolling_logger::LoggerOptions;

#[derive(Parser, Debug)]
#[command(name = "foundit")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for rolling log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_file = rolling_logger::init_with(
        LoggerOptions::new(&args.log_dir, "foundit").with_filter(&args.log_level),
    )
    .context("failed to init rolling logger")?;
    let _ = rolling_logger::info(&format!("Logging to {}", log_file.display()));

    let config = Config::load(args.config.as_deref()).context("invalid configuration")?;

    if let Err(e) = foundit_lib::run(config).await {
        let _ = rolling_logger::error(&format!("Backend stopped: {:#}", e));
        return Err(e);
    }
    Ok(())
}
