mod config;

use clap::{Parser, Subcommand};
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use report_gateway::config::ValidationError;
use report_gateway::errors::GatewayError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const METRICS_PREFIX: &str = "reportd";

#[derive(Parser)]
#[command(name = "reportd", about = "Combined two-instance reporting endpoints")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the report endpoints
    Serve {
        #[arg(long, short)]
        config: PathBuf,
    },
    /// Check a configuration file and exit
    Validate {
        #[arg(long, short)]
        config: PathBuf,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("invalid sentry DSN: {0}")]
    SentryDsn(String),
    #[error("could not set up metrics: {0}")]
    Metrics(String),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "reportd exited with an error");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        CliCommand::Validate { config } => {
            let config = Config::from_file(&config)?;
            config.gateway.validate()?;
            println!("configuration ok");
            Ok(())
        }
        CliCommand::Serve { config } => {
            let config = Config::from_file(&config)?;
            let _sentry = init_logging(&config.logging)?;
            if let Some(metrics) = &config.metrics {
                init_metrics(metrics)?;
            }

            tracing::info!(instance = %config.gateway.instance, "starting reportd");
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(report_gateway::run(config.gateway))?;
            Ok(())
        }
    }
}

/// Installs the fmt subscriber and, when a DSN is configured, the sentry
/// layer. The returned guard flushes sentry on drop.
fn init_logging(config: &LoggingConfig) -> Result<Option<sentry::ClientInitGuard>, CliError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let guard = match config.sentry_dsn.as_deref() {
        Some(dsn) => {
            let dsn = dsn
                .parse::<sentry::types::Dsn>()
                .map_err(|e| CliError::SentryDsn(e.to_string()))?;
            Some(sentry::init(sentry::ClientOptions {
                dsn: Some(dsn),
                release: sentry::release_name!(),
                ..Default::default()
            }))
        }
        None => None,
    };
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(sentry_layer)
        .init();

    Ok(guard)
}

fn init_metrics(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(METRICS_PREFIX))
        .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder)
        .map_err(|_| CliError::Metrics("a metrics recorder is already installed".into()))?;

    shared::metrics_defs::describe_all(report_gateway::metrics_defs::ALL_METRICS);
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "statsd metrics enabled"
    );
    Ok(())
}
