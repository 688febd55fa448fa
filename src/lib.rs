pub mod cli;
pub mod commands;
pub mod download;
pub mod error;
pub mod export;
pub mod fetch;
pub mod logging;
pub mod settings;

pub use cli::Cli;
pub use download::{DownloadReport, Downloader, RunSummary};
pub use error::{AppError, Result};
pub use fetch::{FetchError, Fetched, Fetcher, HttpFetcher};
pub use logging::{LogSink, RecordingSink, Severity, TracingSink};

/// Install the process-wide subscriber. Info and below go to stdout, warnings
/// and errors to stderr. `RUST_LOG` overrides `default_level`.
pub fn init_logging(default_level: &str) {
    use tracing::Level;
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .init();
}
