mod commands;
mod helpers;

use clap::Parser;
use modit_core::domain::ModitError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();
    helpers::init_tracing();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_modit_error();
            eprintln!("{}", error.diagnostic_line());
            eprintln!("{}", error.fatal_exit_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("modit".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "modit", about = "MODIT molecular cross-section synthesis")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Describe a log-uniform wavenumber grid
    Grid(commands::GridArgs),
    /// Synthesize a [layer x wavenumber] cross-section matrix
    Synth(commands::SynthArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Grid(args) => commands::run_grid_command(args),
        CliCommand::Synth(args) => commands::run_synth_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(ModitError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ModitError> for CliError {
    fn from(error: ModitError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_modit_error(&self) -> ModitError {
        match self {
            Self::Usage(message) => ModitError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => ModitError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
