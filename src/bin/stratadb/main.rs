use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod util;
mod cmd_status;
mod cmd_append;
mod cmd_scan;
mod cmd_doctor;

fn init_logger() {
    // RUST_LOG wins; default level is info.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Status { path, json } => cmd_status::exec(path, json),

        cli::Cmd::Append { path, table, values } => cmd_append::exec(path, table, values),

        cli::Cmd::Scan { path, table, json } => cmd_scan::exec(path, table, json),

        cli::Cmd::Doctor { path, json } => cmd_doctor::exec(path, json),
    }
}
