//! `qa-engine` command line.
//!
//! Loads an optional suite configuration and runs the security validator or
//! inspects retry policies from the shell. Results are printed as JSON on
//! stdout; logs and rendered metrics go to stderr.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use qa_engine::config::{load_config, EngineConfig};
use qa_engine::observability::{logging, metrics};
use qa_engine::security::{SecurityType, SecurityValidator};
use qa_engine::TestOperationId;

#[derive(Parser)]
#[command(name = "qa-engine")]
#[command(about = "Retry, performance and security checks for test suites", long_about = None)]
struct Cli {
    /// Suite configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,

    /// Print Prometheus metrics to stderr on exit.
    #[arg(long)]
    emit_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the suite configuration and print the resolved operations
    ValidateConfig,
    /// Scan an input string for attack signatures
    ScanInput {
        /// Security types to check (comma separated).
        #[arg(short, long, value_delimiter = ',')]
        types: Vec<SecurityType>,
        /// Use the types declared for this operation in the suite.
        #[arg(short, long)]
        operation: Option<String>,
        input: String,
    },
    /// Scan a response body for leaks and reflected payloads ("-" reads stdin)
    ScanResponse {
        #[arg(short, long, value_delimiter = ',')]
        types: Vec<SecurityType>,
        #[arg(short, long)]
        operation: Option<String>,
        file: PathBuf,
    },
    /// Check a role and bearer token against the required roles
    CheckAuth {
        #[arg(long)]
        role: String,
        #[arg(long, value_delimiter = ',')]
        required: Vec<String>,
        #[arg(long)]
        token: String,
    },
    /// Print the delay schedule of the suite's default retry policy
    BackoffSchedule,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.observability.log_level);
    logging::init_logging(level);

    let recorder = if cli.emit_metrics || config.observability.metrics_enabled {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    let code = run(cli.command, &config)?;

    if let Some(handle) = recorder {
        eprintln!("{}", handle.render());
    }
    Ok(code)
}

fn run(command: Commands, config: &EngineConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let validator = SecurityValidator::new(&config.security);

    match command {
        Commands::ValidateConfig => {
            let operations = config.resolve_operations()?;
            tracing::info!(operations = operations.len(), "Configuration is valid");
            print_json(&operations)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::ScanInput { types, operation, input } => {
            let types = resolve_types(config, types, operation.as_deref())?;
            let result = validator.validate_input(&input, &types);
            print_json(&result)?;
            Ok(exit_code(result.is_valid))
        }
        Commands::ScanResponse { types, operation, file } => {
            let types = resolve_types(config, types, operation.as_deref())?;
            let body = read_body(&file)?;
            let result = validator.validate_response(&body, &types);
            print_json(&result)?;
            Ok(exit_code(result.is_secure))
        }
        Commands::CheckAuth { role, required, token } => {
            let required: BTreeSet<String> = required.into_iter().collect();
            let result = validator.validate_authentication(&role, &required, &token)?;
            print_json(&result)?;
            Ok(exit_code(result.is_authorized))
        }
        Commands::BackoffSchedule => {
            let policy = config.default_retry_policy()?;
            let delays: Vec<u128> = policy.delays().iter().map(|d| d.as_millis()).collect();
            print_json(&serde_json::json!({
                "max_attempts": policy.max_attempts(),
                "delays_ms": delays,
            }))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Explicit `--types` win; otherwise the operation's declared types are used.
fn resolve_types(
    config: &EngineConfig,
    types: Vec<SecurityType>,
    operation: Option<&str>,
) -> Result<BTreeSet<SecurityType>, Box<dyn std::error::Error>> {
    if !types.is_empty() {
        return Ok(types.into_iter().collect());
    }
    let Some(name) = operation else {
        return Ok(BTreeSet::new());
    };

    let id = TestOperationId::new(name)?;
    let metadata = config
        .resolve_operations()?
        .into_iter()
        .find(|op| op.id == id)
        .ok_or_else(|| format!("operation '{id}' is not defined in the configuration"))?;
    Ok(metadata.security.effective_types())
}

fn read_body(file: &Path) -> std::io::Result<String> {
    if file.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        Ok(body)
    } else {
        std::fs::read_to_string(file)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
