// crates/pmc-rs-cli/src/main.rs
use std::process::ExitCode;

use clap::Parser;

mod args;
mod cmd;

fn main() -> ExitCode {
    let cli = args::Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter())).init();

    match cmd::dispatch(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
