use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use appshelf::cli::{Cli, commands};
use appshelf::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = if let Some(dir) = cli.watch {
        commands::watch::run(dir).await
    } else if let Some(path) = cli.integrate {
        commands::integrate::run(&path).await
    } else if let Some(path) = cli.remove {
        commands::remove::run(&path)
    } else if cli.list {
        commands::list::run()
    } else {
        // The interactive settings shell is a separate front-end; without a
        // mode flag there is nothing headless to do.
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
