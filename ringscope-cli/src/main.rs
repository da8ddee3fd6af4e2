// src/main.rs

//! Ringscope binary entry point.

use clap::Parser;
use ringscope_cli::{parse_error_exit_code, run, Cli};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn try_main(cli: Cli) -> anyhow::Result<bool> {
    let config = cli.resolve_config()?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Ringscope v{}", ringscope_cli::VERSION);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    Ok(run(&cli, &config, &mut out)?)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_error_exit_code(&e));
        }
    };

    match try_main(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
