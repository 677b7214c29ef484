use std::process::ExitCode;

use clap::Parser;
use docai_cli::{run, Cli};
use docai_logging::docai_error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    docai_logging::initialize(cli.log_destination(), cli.log_level());

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        // The backend finished the task but reported failure.
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            docai_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
