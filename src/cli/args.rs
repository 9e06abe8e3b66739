use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "backup", version, about = "Scheduled mirror backups of one directory")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: $BACKUPPER_SETTINGS or ~/.config/backupper/settings.yaml)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a backup now
    Run,
    /// Show schedule and last result
    Status,
    /// Set the interval: none, daily, weekly, monthly, continuous, every:<n><s|m|h|d>
    SetSchedule(ValueArgs),
    /// Set the sync mode: mirror or copy
    SetMode(ValueArgs),
    SetSource(ValueArgs),
    SetDestination(ValueArgs),
    /// Run scheduled backups until interrupted
    Daemon,
}

#[derive(Args, Debug, Clone)]
pub struct ValueArgs {
    pub value: String,
}
