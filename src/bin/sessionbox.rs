//! Sessionbox server
//!
//! Serves the sandbox API over HTTP.

use clap::{Parser, Subcommand};
use sessionbox::config::{load_config, validate_config, Config, LogConfig, LogFormat};
use sessionbox::{gateway, VERSION};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sessionbox",
    version = VERSION,
    about = "Sessionbox - run untrusted code in per-session sandbox directories",
    long_about = None
)]
struct Cli {
    /// Config file (JSON5 or TOML)
    #[arg(long, short, env = "SESSIONBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    bind: Option<String>,

    /// Port
    #[arg(long, short)]
    port: Option<u16>,

    /// Directory holding session directories
    #[arg(long)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Validate the effective configuration and print it
    CheckConfig,
}

impl Cli {
    /// Command-line flags win over file and environment
    fn apply(&self, config: &mut Config) {
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(base_dir) = &self.base_dir {
            config.sandbox.base_dir = base_dir.clone();
        }
    }
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_new(&log.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    init_tracing(&config.log);

    let validation = validate_config(&config);
    for warning in &validation.warnings {
        warn!("Config: {}", warning);
    }
    for issue in &validation.errors {
        error!("Config: {}", issue);
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if !validation.valid {
                anyhow::bail!("configuration has {} error(s)", validation.errors.len());
            }
            Ok(())
        }
        Commands::Serve => {
            if !validation.valid {
                anyhow::bail!("refusing to start with an invalid configuration");
            }
            info!("Starting sessionbox v{}", VERSION);
            gateway::serve(&config).await?;
            Ok(())
        }
    }
}
