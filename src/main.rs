// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use ltmsync::config::{load_declarations, Config};
use ltmsync::constants::{ENV_PASSWORD, ENV_USERNAME};
use ltmsync::metrics::gather_metrics;
use ltmsync::provisioner::{Provisioner, RpcConnector};
use ltmsync::report::RunReport;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

/// Converge load-balancer LTM objects to a declared state.
#[derive(Debug, Parser)]
#[command(name = "ltmsync", version, about)]
struct Cli {
    /// Connection configuration (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write a JSON run report to this file
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Write Prometheus metrics in text format to this file when the run ends
    #[arg(long, global = true)]
    metrics_file: Option<PathBuf>,

    /// Default management API username
    #[arg(long, global = true, env = ENV_USERNAME)]
    username: Option<String>,

    /// Default management API password
    #[arg(long, global = true, env = ENV_PASSWORD, hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Converge every declared resource, then config-sync the devices that changed
    Provision {
        /// Declaration file listing one entry per device
        #[arg(long, short)]
        declarations: PathBuf,
    },
    /// Config-sync every declared device without converging anything
    Sync {
        #[arg(long, short)]
        declarations: PathBuf,
    },
    /// Print a shell completion script
    Completions { shell: clap_complete::Shell },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "ltmsync", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    // Reconcilers await each remote call in turn; one thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .thread_name("ltmsync")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

fn init_tracing() {
    // Respects RUST_LOG, defaulting to INFO
    // RUST_LOG_FORMAT=json switches to structured output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_writer(io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_writer(io::stderr)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(cli: Cli) -> Result<ExitCode> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting ltmsync");

    let mut config = Config::load(cli.config.as_deref()).await?;
    config.override_default_credentials(cli.username, cli.password);
    debug!(scheme = %config.scheme, port = config.port, "Configuration loaded");

    let mut provisioner = Provisioner::new(RpcConnector::new(config));
    let report = match &cli.command {
        Commands::Provision { declarations } => {
            let batch = load_declarations(declarations).await?;
            provisioner.provision(&batch).await
        }
        Commands::Sync { declarations } => {
            let batch = load_declarations(declarations).await?;
            provisioner.sync_all(&batch).await
        }
        Commands::Completions { .. } => return Ok(ExitCode::SUCCESS),
    };

    write_outputs(&report, cli.report.as_deref(), cli.metrics_file.as_deref()).await?;

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn write_outputs(
    report: &RunReport,
    report_path: Option<&Path>,
    metrics_path: Option<&Path>,
) -> Result<()> {
    if let Some(path) = report_path {
        report.write_json(path).await?;
        info!(path = %path.display(), "Run report written");
    }

    if let Some(path) = metrics_path {
        let metrics = gather_metrics().context("Failed to encode metrics")?;
        tokio::fs::write(path, metrics)
            .await
            .with_context(|| format!("Failed to write metrics file {}", path.display()))?;
        info!(path = %path.display(), "Metrics written");
    }

    Ok(())
}
