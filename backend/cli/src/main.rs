mod chat_cmd;
mod config_cmd;
mod serve_cmd;
mod status_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use omnix_config::{config_dir, config_file_path, load_and_prepare, OmnixConfig};

#[derive(Parser)]
#[command(name = "omnix")]
#[command(about = "OMNIX: chat relay and terminal assistant")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.omnix/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Chat with the assistant through a running relay
    Chat {
        /// Assistant mode, e.g. "code" or "research"
        #[arg(short, long)]
        mode: Option<String>,
        /// Use single-shot replies instead of streaming
        #[arg(long)]
        no_stream: bool,
        /// Relay base URL
        #[arg(long)]
        relay: Option<String>,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Query a running relay's health endpoint
    Status {
        /// Relay base URL
        #[arg(long)]
        relay: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        Commands::Serve { port, bind } => {
            let config = load_and_prepare(&path).await?;
            init_logging(&config);
            serve_cmd::run(with_listener(config, bind, port)).await?;
        }
        Commands::Chat {
            mode,
            no_stream,
            relay,
        } => {
            let config = load_and_prepare(&path).await?;
            // Console logs would interleave with the conversation.
            logging::init_logger(config.logging_dir().as_deref(), "warn", false);
            let options = chat_cmd::ChatOptions {
                relay_url: relay.unwrap_or_else(|| config.relay_url().to_string()),
                mode,
                streaming: config.streaming_enabled() && !no_stream,
            };
            chat_cmd::run(&config, options).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => config_cmd::show(&path).await?,
            ConfigAction::Init { force } => config_cmd::init(&path, force).await?,
        },
        Commands::Status { relay } => {
            let config = load_and_prepare(&path).await?;
            status_cmd::run(relay.as_deref().unwrap_or(config.relay_url())).await?;
        }
    }

    Ok(())
}

fn init_logging(config: &OmnixConfig) {
    let json = config
        .logging
        .as_ref()
        .and_then(|l| l.json)
        .unwrap_or(false);
    logging::init_logger(config.logging_dir().as_deref(), config.log_level(), json);
}

/// Command-line flags win over the config file.
fn with_listener(mut config: OmnixConfig, bind: Option<String>, port: Option<u16>) -> OmnixConfig {
    if bind.is_none() && port.is_none() {
        return config;
    }
    let server = config.server.get_or_insert_with(Default::default);
    if let Some(bind) = bind {
        server.bind = Some(bind);
    }
    if let Some(port) = port {
        server.port = Some(port);
    }
    config
}
