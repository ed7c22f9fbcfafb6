//! proxy-audit CLI
//!
//! Verifies a materialized proxy configuration file against a declarative
//! TOML spec, or dumps the parsed section map for debugging.
//!
//! ```text
//! spec.toml ──► config::load_spec ──► AuditSpec
//!                                        │
//! haproxy.cfg ─► client (read) ─► parser │
//!                         │              ▼
//!                    ProxyConfig ──► audit::run ──► AuditReport
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proxy_audit::client::{FileLifecycleClient, ProxyLifecycleClient};
use proxy_audit::parser::{ConfigParser, SectionMarker};
use proxy_audit::{audit, config};

#[derive(Parser)]
#[command(name = "proxy-audit")]
#[command(about = "Verify materialized proxy configs against declared intent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full audit of a config file against a spec
    Verify {
        /// Path to the TOML audit spec
        #[arg(short, long)]
        spec: PathBuf,

        /// Path to the materialized proxy configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Emit the report as JSON instead of human-readable lines
        #[arg(long)]
        json: bool,
    },
    /// Parse a config file and print the managed section map as JSON
    Dump {
        /// Path to the materialized proxy configuration
        #[arg(short, long)]
        config: PathBuf,

        /// Managed-section marker substring
        #[arg(short, long, default_value = "scalr")]
        marker: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proxy_audit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Verify { spec, config, json } => {
            let spec = config::load_spec(&spec)?;
            let client = FileLifecycleClient::new(config);
            let text = client.materialized_config_text()?;

            let outcome = ConfigParser::new(SectionMarker::new(spec.marker.clone())).parse(&text);
            if !outcome.malformed.is_empty() {
                tracing::warn!(
                    dropped = outcome.malformed.len(),
                    "some section headers could not be parsed"
                );
            }

            let report = audit::run(&spec, &outcome.config);
            tracing::info!(
                checks = report.checks,
                failures = report.failures.len(),
                "audit finished"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for failure in &report.failures {
                    println!("FAIL port {}: {}", failure.port, failure.kind);
                }
                println!(
                    "{} of {} checks passed",
                    report.checks - report.failures.len(),
                    report.checks
                );
            }

            Ok(if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Dump { config, marker } => {
            let client = FileLifecycleClient::new(config);
            let text = client.materialized_config_text()?;
            let outcome = ConfigParser::new(SectionMarker::new(marker)).parse(&text);

            for header in &outcome.malformed {
                tracing::warn!(header = %header.header, "dropped section");
            }
            println!("{}", serde_json::to_string_pretty(&outcome.config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
