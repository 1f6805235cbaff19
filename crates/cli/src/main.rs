mod bridge_commands;
mod config_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use config_commands::Scope;

#[derive(Parser)]
#[command(
    name = "ragbridge",
    version,
    about = "Ragbridge: answer Telegram messages with a file-search assistant"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: discover ragbridge.{toml,yaml,yml,json}).
    #[arg(long, global = true, env = "RAGBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the bridge (default when no subcommand is provided).
    Run,
    /// Create the assistant and vector store, then print their ids.
    Provision,
    /// Answer one query and print it.
    Ask {
        #[arg(short, long)]
        message: String,
    },
    /// Validate the configuration and report errors/warnings.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "ragbridge starting");

    let (config, config_path) = config_commands::load(cli.config.as_deref())?;
    let report = ragbridge_config::validate(&config, config_path);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            config_commands::ensure_valid(&report, Scope::All)?;
            bridge_commands::run(config).await
        },
        Commands::Provision => {
            config_commands::ensure_valid(&report, Scope::Assistant)?;
            bridge_commands::provision_only(config).await
        },
        Commands::Ask { message } => {
            config_commands::ensure_valid(&report, Scope::Assistant)?;
            bridge_commands::ask(config, &message).await
        },
        Commands::Check => config_commands::check(&report),
    }
}
