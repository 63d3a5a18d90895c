//! keepalived — the keepalive monitor daemon.
//!
//! Pings a fixed list of health endpoints every five minutes, retries
//! failures, mails the operator when an endpoint stays down, and mails a
//! digest of the day's failures shortly after local midnight.
//!
//! # Usage
//!
//! ```text
//! keepalived run --port 3000 --config keepalive.toml
//! keepalived check
//! ```
//!
//! Mail credentials come from `EMAIL_USER`, `EMAIL_PASS` and `EMAIL_TO`,
//! read from the environment or a `.env` file.

mod check;
mod monitor;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keepalived", about = "Endpoint keep-alive and health monitor")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the monitor until interrupted.
    Run {
        /// Port for the liveness endpoint.
        #[arg(long, env = "PORT", default_value = "3000")]
        port: u16,

        /// Optional keepalive.toml overriding the built-in defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Sweep immediately instead of waiting one interval.
        #[arg(long)]
        sweep_on_start: bool,
    },
    /// Sweep every endpoint once, print the results, and exit.
    Check {
        /// Optional keepalive.toml overriding the built-in defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Mail failure alerts instead of only logging them.
        #[arg(long)]
        notify: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    match cli.command {
        Command::Run {
            port,
            config,
            sweep_on_start,
        } => monitor::run(port, config, sweep_on_start).await,
        Command::Check { config, notify } => check::run(config, notify).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,keepalive=debug"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
