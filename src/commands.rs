use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::download::Downloader;
use crate::error::Result;
use crate::fetch::HttpFetcher;
use crate::logging::TracingSink;
use crate::settings::Settings;
use crate::AppError;

/// Everything a download run needs once the command line, environment and
/// settings file have been merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub token: String,
    pub paths: Vec<PathBuf>,
    pub output_directory: PathBuf,
    pub dry_run: bool,
    pub timeout: Option<Duration>,
}

impl RunConfig {
    /// Command line first, then `env_token` (SLACK_TOKEN), then the settings file.
    pub fn resolve(cli: Cli, env_token: Option<String>, settings: Settings) -> Result<Self> {
        let token = cli
            .token
            .or(env_token)
            .or(settings.download.token)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::MissingToken)?;

        let output_directory = match cli
            .output_directory
            .or(settings.download.output_directory.map(PathBuf::from))
        {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        let timeout = cli
            .timeout_secs
            .or(settings.download.timeout_secs)
            .map(Duration::from_secs);

        Ok(Self {
            token,
            paths: cli.paths,
            output_directory,
            dry_run: cli.dry_run,
            timeout,
        })
    }
}

pub fn load_token() -> Option<String> {
    std::env::var("SLACK_TOKEN").ok()
}

pub fn run_download(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli.settings)?;
    let config = RunConfig::resolve(cli, load_token(), settings)?;

    tracing::debug!(
        output_directory = %config.output_directory.display(),
        dry_run = config.dry_run,
        timeout = ?config.timeout,
        "Resolved configuration"
    );

    let fetcher = HttpFetcher::new(config.timeout)?;
    let downloader =
        Downloader::new(config.token, fetcher, TracingSink).with_dry_run(config.dry_run);

    let summary = downloader.run(&config.paths, &config.output_directory)?;

    let verb = if downloader.is_dry_run() {
        "would be downloaded"
    } else {
        "downloaded"
    };
    println!(
        "Done! {} files {} from {} export files, {} inputs skipped.",
        summary.report.total_downloaded(),
        verb,
        summary.report.len(),
        summary.skipped_inputs
    );
    Ok(())
}
