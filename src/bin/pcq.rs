//! `pcq` command line.
//!
//! Credentials come from the environment, or from a `.env` file in the
//! working directory (or `--env-file`).
//!
//! ```sh
//! export PRISMA_API_URL=api.prismacloud.io
//! export PRISMA_ACCESS_KEY=...
//! export PRISMA_SECRET_KEY=...
//! pcq defenders --debug
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use pcq::cli::{self, Cli};
use pcq::config::load_env_file;
use pcq::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match cli.logging_config().install() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to set up logging: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    info!("======================= START =======================");
    if cli.debug {
        info!("======================= DEBUG MODE =======================");
    }

    match load_env_file(cli.env_file.as_deref()) {
        Ok(Some(path)) => info!(path = %path.display(), "loaded env file"),
        Ok(None) => {}
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command;
    let result: anyhow::Result<()> = runtime.block_on(async move {
        let config = AppConfig::from_env()?;
        let stdin = std::io::stdin();
        cli::run(command, &config, &mut stdin.lock()).await
    });

    match result {
        Ok(()) => {
            info!("======================= END =======================");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
