use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use irrf_core::{IrrfWorksheet, MONTHLY_TABLE, RawIrrfInput};
use irrf_server::{
    ConfigOverrides, ServerConfig, api, csv_batch,
    logging::init_logging,
};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Brazilian monthly withholding income tax (IRRF) calculator.
#[derive(Debug, Parser)]
#[command(name = "irrf", version, about, long_about = None)]
struct Cli {
    /// Log level or EnvFilter directive. `RUST_LOG` wins when set.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve {
        /// TOML configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Interface to listen on (overrides the config file).
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides the config file).
        #[arg(short, long)]
        port: Option<u16>,

        /// Append log records to this file (overrides the config file).
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Calculate a single withholding and print it as JSON.
    Calculate {
        /// Monthly taxable income.
        #[arg(long, allow_hyphen_values = true)]
        income: f64,

        /// Official social-security contribution.
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        contribution: f64,

        /// Number of dependents.
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        dependents: f64,

        /// Alimony paid.
        #[arg(long, allow_hyphen_values = true)]
        alimony: Option<f64>,

        /// Include the step-by-step calculation trace.
        #[arg(long)]
        trace: bool,
    },

    /// Calculate every row of a CSV file and write the results as CSV.
    Batch {
        /// Input CSV with taxable_income, official_pension_contribution,
        /// dependent_count and optional alimony columns.
        #[arg(short, long)]
        file: PathBuf,

        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the bracket table as CSV.
    Brackets,
}

const ONE_SHOT_LOG_LEVEL: &str = "warn";

// ─── commands ────────────────────────────────────────────────────────────────

async fn run_serve(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
) -> Result<()> {
    let config = ServerConfig::load(config_path.as_deref())
        .context("failed to load server configuration")?
        .with_overrides(overrides);

    init_logging(&config.log_level, config.log_file.as_deref())?;
    debug!(?config, "starting server");

    api::serve(&config).await
}

fn run_calculate(
    input: RawIrrfInput,
    include_trace: bool,
) -> Result<()> {
    let request = api::CalculationRequest {
        input,
        include_trace,
    };
    let result = api::calculate(&IrrfWorksheet::default(), &request)?;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &result).context("failed to write result")?;
    writeln!(stdout)?;
    Ok(())
}

fn run_batch(
    file: PathBuf,
    output: Option<PathBuf>,
) -> Result<()> {
    let reader =
        File::open(&file).with_context(|| format!("Failed to open: {}", file.display()))?;
    let rows = csv_batch::calculate_batch(&IrrfWorksheet::default(), reader)
        .with_context(|| format!("Failed to read CSV: {}", file.display()))?;

    match output {
        Some(path) => {
            let writer = File::create(&path)
                .with_context(|| format!("Failed to create: {}", path.display()))?;
            csv_batch::write_batch(&rows, writer)?;
        }
        None => csv_batch::write_batch(&rows, io::stdout().lock())?,
    }
    Ok(())
}

fn one_shot_level(requested: Option<&str>) -> &str {
    requested.unwrap_or(ONE_SHOT_LOG_LEVEL)
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            bind,
            port,
            log_file,
        } => {
            let overrides = ConfigOverrides {
                bind_address: bind,
                port,
                log_level: cli.log_level,
                log_file,
            };
            run_serve(config, overrides).await
        }
        Command::Calculate {
            income,
            contribution,
            dependents,
            alimony,
            trace,
        } => {
            init_logging(one_shot_level(cli.log_level.as_deref()), None)?;
            let input = RawIrrfInput {
                taxable_income: income,
                official_pension_contribution: contribution,
                dependent_count: dependents,
                alimony,
            };
            run_calculate(input, trace)
        }
        Command::Batch { file, output } => {
            init_logging(one_shot_level(cli.log_level.as_deref()), None)?;
            run_batch(file, output)
        }
        Command::Brackets => {
            init_logging(one_shot_level(cli.log_level.as_deref()), None)?;
            csv_batch::write_brackets(&MONTHLY_TABLE, io::stdout().lock())?;
            Ok(())
        }
    }
}
