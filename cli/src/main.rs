use clap::Parser;
use infrastructure::config::Config;
use presentation::cli::{Cli, CliApp};
use presentation::output::report_error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    shared::logging::init(if cli.verbose { "info" } else { "warn" });

    let result = match Config::load() {
        Ok(config) => CliApp::new(config).run(cli).await,
        Err(err) => Err(err),
    };
    if let Err(err) = result {
        report_error(&err);
        std::process::exit(1);
    }
}
