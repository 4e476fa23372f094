// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! wcagbot CLI and server entry point

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wcagbot::api::{self, AppState};
use wcagbot::audit::PageSpeedClient;
use wcagbot::config::{Config, IsolationMode};
use wcagbot::report::{generate_report, OutputFormat};
use wcagbot::supervisor::{AnalysisService, TaskAnalyzer, WorkerCommand, WorkerSupervisor};
use wcagbot::worker::{self, AnalysisRequest};

#[derive(Parser)]
#[command(name = "wcagbot")]
#[command(about = "WCAG A/AA classification of PageSpeed accessibility audits")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "wcagbot.toml", global = true)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Analyze a single URL and print the result
    Analyze {
        /// Page to audit
        url: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: FormatArg,
    },

    /// Isolated worker: reads one request on stdin, writes one reply on stdout
    #[command(hide = true)]
    Worker,
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// Logs always go to stderr: a worker's stdout is its reply channel.
fn init_logging(verbose: bool) {
    let filter = if verbose { "wcagbot=debug" } else { "wcagbot=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    config.validate().context("invalid configuration")?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            serve(&config, &cli.config, &host, port).await
        }
        Commands::Analyze { url, format } => analyze(&config, &cli.config, &url, format.into()).await,
        Commands::Worker => run_worker(&config).await,
    }
}

/// Build the configured analysis backend
fn analysis_service(config: &Config, config_path: &str) -> anyhow::Result<Arc<dyn AnalysisService>> {
    let service: Arc<dyn AnalysisService> = match config.analysis.isolation {
        IsolationMode::Process => {
            Arc::new(WorkerSupervisor::new(WorkerCommand::current_exe(config_path)?))
        }
        IsolationMode::Task => {
            let client = PageSpeedClient::new(&config.pagespeed, config.api_key()?)?;
            Arc::new(TaskAnalyzer::new(Arc::new(client), config.analysis.mode))
        }
    };
    Ok(service)
}

async fn serve(config: &Config, config_path: &str, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState {
        analyzer: analysis_service(config, config_path)?,
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port))
        .await
        .with_context(|| format!("binding {}:{}", host, port))?;
    tracing::info!(
        "Listening on http://{}:{} ({:?} isolation, {:?} mode)",
        host,
        port,
        config.analysis.isolation,
        config.analysis.mode
    );

    axum::serve(listener, app).await?;
    Ok(())
}

async fn analyze(config: &Config, config_path: &str, url: &str, format: OutputFormat) -> anyhow::Result<()> {
    let service = analysis_service(config, config_path)?;
    let result = service.analyze(AnalysisRequest::new(url)).await?;
    println!("{}", generate_report(&result, format));
    Ok(())
}

async fn run_worker(config: &Config) -> anyhow::Result<()> {
    let client = PageSpeedClient::new(&config.pagespeed, config.api_key()?)?;
    worker::serve_once(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        &client,
        config.analysis.mode,
    )
    .await?;
    Ok(())
}
