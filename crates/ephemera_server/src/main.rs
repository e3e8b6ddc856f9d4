//! Headless API server entrypoint.

use ephemera_server::config::{env_flag_enabled, Config};
use ephemera_server::DEFAULT_PORT;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    version: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            "--version" | "-V" => flags.version = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

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
    let flags = parse_cli_flags(&args)?;
    if flags.help {
        print_help();
        return Ok(());
    }
    if flags.version {
        println!("ephemera-server {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::from_env();
    let allow_public = env_flag_enabled("ALLOW_PUBLIC_ACCESS");
    if allow_public {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    ephemera_server::run(config, allow_public, ephemera_server::shutdown_signal()).await
}

fn print_help() {
    println!("Ephemera Server\n");
    println!("Usage: ephemera-server [OPTIONS]\n");
    println!("Options:");
    println!("  -h, --help        Show this help message");
    println!("  -V, --version     Print the version");
    println!("\nEnvironment variables:");
    println!("  DB_PATH           Metadata database path (default: ~/.cache/ephemera/db)");
    println!("  BLOB_DIR          Blob directory (default: ~/.cache/ephemera/blobs)");
    println!("  PORT              Server port (default: {})", DEFAULT_PORT);
    println!(
        "  BIND              Override bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
    println!("  MAX_UPLOAD_SIZE   Maximum upload size in bytes (default: 100MB)");
    println!("  MAX_PASTE_SIZE    Maximum paste size in bytes (default: 10MB)");
    println!("  DEFAULT_TTL       TTL applied when none is given (default: 24h)");
    println!("  MAX_TTL           Largest accepted TTL (default: 720h)");
    println!("  SWEEP_INTERVAL    Time between expiry sweeps (default: 1h)");
    println!("  STORAGE_TIMEOUT   Per-request storage deadline (default: 30s)");
    println!("  ALLOW_PUBLIC_ACCESS  Allow CORS from any origin and non-loopback binds");
}
