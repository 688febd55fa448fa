use clap::Parser;
use slack_export_files::Cli;

fn main() {
    // Parsed before logging so --help prints without a subscriber installed
    let cli = Cli::parse();

    slack_export_files::init_logging(cli.log_level());

    if let Err(e) = slack_export_files::commands::run_download(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
