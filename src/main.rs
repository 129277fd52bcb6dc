use adforge::cli::Cli;
use adforge::logging::{init_from_env, log_error};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (ignore errors if missing)
    dotenvy::dotenv().ok();

    let _log_guard = init_from_env()?;

    let cli = Cli::parse();
    cli.run().inspect_err(|e| log_error(e, "command failed"))
}
