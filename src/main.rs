mod cli;
mod logging;
mod run;

use clap::Parser;

use crate::cli::Cli;
use crate::run::{Outcome, environment_snapshot};

#[tokio::main]
async fn main() {
    // A local .env is a development convenience; CI provides real variables.
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    match run::run(&cli, environment_snapshot()).await {
        Ok(Outcome::Reported(report)) => print!("{report}"),
        Ok(Outcome::Skipped(reason)) => eprintln!("hub-comment: {reason}"),
        Err(err) => {
            eprintln!("hub-comment: {err:#}");
            std::process::exit(1);
        }
    }
}
