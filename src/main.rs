use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use planetarium::config::{CliOverrides, Config};
use planetarium::server::ServerError;
use planetarium::{logger, Server};

const PRODUCT_NAME: &str = "Planetarium";
const BINARY_ICON: &str = "🪐";

#[derive(Parser, Debug)]
#[command(name = "planetarium", about = "Planetarium is a server to run the cosmos chain directory")]
struct Cli {
    /// Log filter, e.g. `info` or `planetarium=debug` (overrides config)
    #[arg(short = 'l', long, global = true)]
    log_level: Option<String>,

    /// Log line format: pretty or json
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a Planetarium server
    Start(StartArgs),
    /// Display the current version
    Version,
}

#[derive(Args, Debug)]
struct StartArgs {
    /// Listening port for the planetarium service [default: 5353]
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to listen on [default: 0.0.0.0]
    #[arg(long)]
    host: Option<String>,

    /// Where to serve chain registry data from
    #[arg(short = 'c', long)]
    chain_registry_directory: Option<PathBuf>,

    /// Where to serve validator registry data from
    #[arg(short = 'v', long)]
    validator_registry_directory: Option<PathBuf>,

    /// Optional configuration file (TOML, YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
        Command::Start(ref args) => {
            let overrides = CliOverrides {
                host: args.host.clone(),
                port: args.port,
                chain_registry_directory: args.chain_registry_directory.clone(),
                validator_registry_directory: args.validator_registry_directory.clone(),
                log_level: cli.log_level.clone(),
                log_format: cli.log_format.clone(),
            };
            start(args.config.as_deref(), &overrides)
        }
    }
}

fn print_version() {
    println!("{BINARY_ICON} {PRODUCT_NAME}");
    println!("   - Version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "   - Git Revision: {}",
        option_env!("PLANETARIUM_GIT_REVISION").unwrap_or("unknown")
    );
}

fn start(config_path: Option<&std::path::Path>, overrides: &CliOverrides) -> ExitCode {
    // Logging is not up yet, so configuration errors go to stderr
    let cfg = match Config::load_from(config_path, overrides) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logger::init(&cfg.logging) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        tracing::info!(workers, "using configured worker threads");
    }
    let runtime = match runtime_builder.build() {
        Ok(runtime) => runtime,
        Err(e) => {
            logger::log_error(&format!("Failed to build runtime: {e}"));
            return ExitCode::FAILURE;
        }
    };

    let result: Result<(), ServerError> = runtime.block_on(async {
        let server = Arc::new(Server::from_config(&cfg)?);
        server.start(&cfg.server).await
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&format!("fatal error: {e}"));
            ExitCode::FAILURE
        }
    }
}
