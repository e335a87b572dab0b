mod server;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use matchtv_core::{logging, Config};

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(name = "matchtv")]
#[command(about = "Live match schedules and same-origin HLS stream relay", long_about = None)]
struct Args {
    /// Config file (YAML or TOML); defaults to ./config.yaml when present
    #[arg(long, env = "MATCHTV_CONFIG_PATH")]
    config: Option<String>,
}

/// Resolve the config file: flag/env first, then `./config.yaml`, else env-only
fn load_config(explicit: Option<&str>) -> Result<Config> {
    let config_path = explicit.map(str::to_string).or_else(|| {
        Path::new(DEFAULT_CONFIG_FILE)
            .exists()
            .then(|| DEFAULT_CONFIG_FILE.to_string())
    });

    let config = match config_path {
        Some(path) => {
            if !Path::new(&path).exists() {
                anyhow::bail!("Config file {path} does not exist");
            }
            eprintln!("Loading config from {path}");
            Config::from_file(&path).map_err(|e| anyhow::anyhow!("Failed to load {path}: {e}"))?
        }
        None => {
            eprintln!("No config file found, using environment variables");
            Config::from_env()?
        }
    };

    // Fail fast on misconfigurations
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load configuration
    let config = load_config(args.config.as_deref())?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("MatchTV server starting...");
    info!("HTTP address: {}", config.http_address());

    // 3. Serve until shutdown
    server::run(&config).await
}
