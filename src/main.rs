//! Command-line entry point for the relay forward proxy

use clap::{Parser, Subcommand};
use relay_forward_proxy::{cli::ServerArgs, init_logger_with_config, log_error, log_info};

#[derive(Parser)]
#[command(name = "relay-forward-proxy")]
#[command(about = "A single-hop HTTP forward proxy with pluggable upstream transports")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging (overrides the configured log level)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the proxy server
    #[command(name = "server")]
    Server(ServerArgs),

    /// Print the effective configuration as YAML and exit
    #[command(name = "config")]
    Config(ServerArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default action: start the server with the default configuration file
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Server(ServerArgs::default()));

    match command {
        Commands::Server(args) => {
            let mut config = args.to_config()?;
            if cli.verbose {
                config.log_level = "debug".to_string();
            }
            init_logger_with_config(&config.log_level);

            log_info!("🚀 Starting Relay Forward Proxy v{}", env!("CARGO_PKG_VERSION"));
            if let Err(e) = ServerArgs::start_server(config).await {
                log_error!("Server error: {:#}", e);
                return Err(e);
            }
        }
        Commands::Config(args) => {
            let config = args.to_config()?;
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}
