use clap::Parser;
use cloudapi_clilib::cli::{CliArgs, ProcessCommand};
use cloudapi_clilib::context::Context;
use cloudapi_clilib::error::Result;
use cloudapi_clilib::logger::system_logger;
use cloudapi_clilib::ExitStatus;
use colored::Colorize;
use std::io::IsTerminal;
use std::process::ExitCode;

async fn run(args: CliArgs) -> Result<ExitStatus> {
    let interactive =
        !args.no_interaction && console::user_attended_stderr() && std::io::stdin().is_terminal();

    // Initialize the Context, which holds the Config data.
    let context = Context::init()?
        .with_verbosity(args.verbose)
        .with_interaction(interactive)
        .with_spec(args.spec.clone());

    if let Err(e) = system_logger(context.cache_dir(), &context.config().common.log_level) {
        eprintln!("{} Logging disabled: {}", "[WARNING]".yellow(), e);
    }

    args.command.process_command(&context).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let args = CliArgs::parse();

    match run(args).await {
        Ok(status) => status.into(),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            ExitStatus::Failure.into()
        }
    }
}
