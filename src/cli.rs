use std::path::PathBuf;

use clap::Parser;

use crate::settings::SETTINGS_FILE;

#[derive(Parser, Debug)]
#[command(name = "slack-export-files")]
#[command(about = "Download the files attached to messages in a Slack export")]
#[command(version)]
pub struct Cli {
    /// Directories containing Slack export JSON files, or JSON files themselves
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Slack API token, defaults to SLACK_TOKEN or the settings file
    #[arg(short, long)]
    pub token: Option<String>,

    /// Base directory to download into, defaults to the current directory
    #[arg(short, long)]
    pub output_directory: Option<PathBuf>,

    /// Log what would be downloaded without downloading or creating directories
    #[arg(long)]
    pub dry_run: bool,

    /// Per-request timeout in seconds, requests never time out by default
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Settings file path
    #[arg(long, default_value = SETTINGS_FILE)]
    pub settings: PathBuf,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
