//! logger-pipe binary entry point.

use std::io::Write;
use std::process::ExitCode;

use logger_pipe::cli::{self, Args};
use logger_pipe::config::Config;
use logger_pipe::sink::TracingSink;
use logger_pipe::{logging, CommandExecutor, LoggerPipeError};

const EXIT_USAGE: u8 = 2;
const EXIT_TIMEOUT: u8 = 124;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'logger-pipe --help' for more information.");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    run(args).await
}

async fn run(args: Args) -> ExitCode {
    let Some(command) = args.command_line() else {
        eprintln!("error: no command given");
        eprintln!("Try 'logger-pipe --help' for more information.");
        return ExitCode::from(EXIT_USAGE);
    };

    let (config, options) = match Config::load(&args).and_then(|c| {
        let options = c.to_options()?;
        Ok((c, options))
    }) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    logging::init(Some(config.log_filter()));

    match CommandExecutor::new(TracingSink, command, options).execute().await {
        Ok(output) => {
            if let Some(output) = output {
                let mut stdout = std::io::stdout().lock();
                if stdout.write_all(output.as_bytes()).and_then(|_| stdout.flush()).is_err() {
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(LoggerPipeError::CommandFailure { exit_code, .. }) => {
            let code = exit_code
                .and_then(|c| u8::try_from(c).ok())
                .filter(|c| *c != 0)
                .unwrap_or(1);
            ExitCode::from(code)
        }
        Err(LoggerPipeError::DeadlineExceeded { .. }) => ExitCode::from(EXIT_TIMEOUT),
        Err(LoggerPipeError::InvalidConfiguration(msg)) => {
            eprintln!("error: {}", msg);
            ExitCode::from(EXIT_USAGE)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
