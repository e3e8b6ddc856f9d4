//! Headless API server entrypoint.

use ephemera::config::{env_flag_enabled, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ephemera=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().skip(1).any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let allow_public = env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    if allow_public {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    ephemera::run(config, allow_public, ephemera::shutdown_signal()).await
}

fn print_help() {
    println!("Ephemera\n");
    println!("Usage: ephemera [--help]\n");
    println!("Runs the API server with the expiry sweeper. Configuration is read from");
    println!("the environment; see `ephemera-server --help` for the full list.");
    println!(
        "\n  PORT              Server port (default: {})",
        ephemera::DEFAULT_PORT
    );
    println!("  DB_PATH           Metadata database path");
    println!("  BLOB_DIR          Blob directory");
}
