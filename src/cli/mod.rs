use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Cli, Command};
use crate::cli::commands::{daemon, exit_for_error, run, settings, status};
use crate::service::BackupService;
use crate::util::paths::default_settings_path;

pub mod args;
pub mod commands;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings_path = cli.settings.unwrap_or_else(default_settings_path);
    let service = BackupService::open(&settings_path);

    let outcome = match cli.command {
        Command::Run => run::run_now(&service),
        Command::Status => status::print_status(&service),
        Command::SetSchedule(args) => settings::set_schedule(&service, &args.value),
        Command::SetMode(args) => settings::set_mode(&service, &args.value),
        Command::SetSource(args) => settings::set_source(&service, &args.value),
        Command::SetDestination(args) => settings::set_destination(&service, &args.value),
        Command::Daemon => daemon::run_daemon(&service),
    };
    if let Err(err) = outcome {
        exit_for_error(&err);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
