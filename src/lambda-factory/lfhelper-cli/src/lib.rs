//! CLI for lambda-factory: scaffold a function and register it with AWS Lambda.

pub mod install;
pub mod output;
pub mod package;
pub mod provision;
pub mod rollback;
pub mod scaffold;
pub mod service;
pub mod session;

use anyhow::{Context, Result};
use clap::Parser;
use lfhelper_config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

pub use provision::{Provisioned, Provisioner};
pub use service::{CreateRequest, FunctionDescriptor, FunctionService, LambdaService};
pub use session::{Prompter, Session, TerminalPrompter};

#[derive(Parser)]
#[command(name = "lambda-factory")]
#[command(version, about = "Scaffold a function project and register it with AWS Lambda", long_about = None)]
pub struct Cli {
    /// Name for the new function (prompted interactively if not provided)
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Configuration file (defaults to ./lambda-factory.toml when present)
    #[arg(long, short = 'c', env = "LAMBDA_FACTORY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Main entry point for the CLI.
pub fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = tokio::runtime::Runtime::new()
        .context("Failed to start the async runtime")
        .and_then(|runtime| runtime.block_on(run(cli)));

    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration and drive one provisioning run.
///
/// Setup problems (unreadable working directory, bad configuration) are
/// returned as errors. Failures during provisioning itself are reported
/// with the operator instructions and turned into a failing exit code.
async fn run(cli: Cli) -> Result<ExitCode> {
    let root = std::env::current_dir().context("Failed to read the working directory")?;
    let config = Config::discover(&root, cli.config.as_deref())
        .context("Failed to load configuration")?;

    let service = LambdaService::from_env(config.function.region.as_deref()).await;
    let provisioner = Provisioner::new(service, config, root);

    let mut session = Session::open(TerminalPrompter::default());
    let outcome = provisioner.run(&mut session, cli.name).await;
    session.close();

    match outcome {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            output::report_failure(&err);
            Ok(ExitCode::FAILURE)
        }
    }
}
