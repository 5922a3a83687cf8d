//! junops - Entry Point

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use junops::app::run::run;
use junops::cli::Cli;
use junops::credentials::default_source;
use junops::logs::init_logging;
use junops::session::NetconfConnector;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_options()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let options = match cli.into_command() {
        Ok(Some(options)) => options,
        Ok(None) => {
            println!("See '--help'");
            return;
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    info!("Running {} with options: {:?}", options.operation.name(), options);
    let connector = Arc::new(NetconfConnector::new(options.session.clone()));
    let credentials = default_source();
    let mut stdout = std::io::stdout();

    match run(&options, credentials.as_ref(), connector, &mut stdout).await {
        Ok(summary) => {
            info!(
                "Run complete: {} succeeded, {} failed",
                summary.succeeded, summary.failed
            );
            if let Some(path) = summary.written {
                info!("Results saved to {}", path.display());
            }
        }
        Err(e) => {
            error!("Run aborted: {e}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
