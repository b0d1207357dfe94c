//! DAO daemon — command-line entry point for the governance engine.

mod config;
mod script;

use anyhow::Context;
use clap::Parser;
use config::DaemonConfig;
use dao_utils::LogFormat;
use script::Script;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dao-daemon", about = "Stakeholder DAO governance engine")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "DAO_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "DAO_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "DAO_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Voting window in seconds.
    #[arg(long, env = "DAO_VOTING_WINDOW_SECS")]
    voting_window_secs: Option<u64>,

    /// Delay between confirmation polls, in milliseconds.
    #[arg(long, env = "DAO_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the effective configuration as TOML.
    Params,

    /// Replay a JSON script of user actions and print a JSON report.
    Simulate {
        /// Script file.
        #[arg(long)]
        script: PathBuf,

        /// Also print Prometheus metrics after the report.
        #[arg(long)]
        metrics: bool,
    },
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => DaemonConfig::default(),
        };
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(secs) = self.voting_window_secs {
            config.governance.voting_window_secs = secs;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.client.poll_interval_ms = ms;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    dao_utils::init_logging(config.log_format, &config.log_level)?;

    if let Some(path) = &cli.config {
        tracing::info!(config = %path.display(), "loaded config");
    }

    match cli.command {
        Command::Params => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Simulate {
            script: script_path,
            metrics,
        } => {
            let text = std::fs::read_to_string(&script_path)
                .with_context(|| format!("reading script {}", script_path.display()))?;
            let parsed = Script::from_json(&text)?;
            tracing::info!(
                steps = parsed.steps.len(),
                window = %dao_utils::format_duration(config.governance.voting_window_secs),
                "starting simulation"
            );
            let session = script::run(&parsed, config.governance, config.client).await?;
            println!("{}", serde_json::to_string_pretty(&session.report)?);
            if metrics {
                print!("{}", session.engine.metrics().encode());
            }
        }
    }
    Ok(())
}
