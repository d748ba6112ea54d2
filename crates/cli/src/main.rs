mod config_commands;
mod replay_commands;

use {
    clap::{Parser, Subcommand},
    std::path::PathBuf,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "murmur", about = "Murmur, a per-group chat history collector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the discovered one.
    #[arg(long, global = true, env = "MURMUR_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a JSON-lines file of recorded sessions through a collector.
    Replay {
        /// Path to the recording, or `-` for stdin.
        file: PathBuf,
        /// Only print the final history of this group.
        #[arg(long)]
        group: Option<String>,
    },
    /// Show the effective configuration and its diagnostics.
    Config,
}

/// Initialise tracing. Logs go to stderr so stdout stays machine-readable.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<murmur_config::MurmurConfig> {
    let Some(path) = &cli.config else {
        return Ok(murmur_config::discover_and_load());
    };
    debug!(path = %path.display(), "loading config from --config");
    let mut config = murmur_config::load_config(path)?;
    murmur_config::apply_env_overrides(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Replay { file, group } => {
            replay_commands::run(&config, &file, group.as_deref()).await
        },
        Commands::Config => config_commands::show(&config),
    }
}
