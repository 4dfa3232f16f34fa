//! Client for the lab controller daemon.
//!
//! [`Client`] exposes one method per gateway operation. Driver agents wrap
//! it in a [`Driver`], which remembers the token issued at registration.
//! The `labcon` binary drives the same calls from the command line, printing
//! each JSON result on stdout and failures on stderr.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

use labcon_types::{DriverToken, Operation, Payload, Request};

mod cli;
mod client;
mod config;
mod driver;
mod errors;
mod transport;

use cli::{Cli, CliCommand, StateAction, StatusAction};
pub use client::Client;
use config::{ConfigLoader, OrthoConfigLoader, prepare_cli_arguments, split_config_arguments};
pub use driver::Driver;
use errors::AppError;
pub use errors::ClientError;

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    match execute(&args, loader, stdout) {
        Ok(()) => ExitCode::SUCCESS,
        // Help and version output are not failures.
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            let _ = writeln!(stderr, "labcon: {error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write, L: ConfigLoader>(
    args: &[OsString],
    loader: &L,
    stdout: &mut W,
) -> Result<(), AppError> {
    let split = split_config_arguments(args);
    let cli = Cli::try_parse_from(prepare_cli_arguments(args, &split))
        .map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    let request = build_request(cli.command)?;
    let result = Client::new(config.daemon_socket().clone()).call(&request)?;
    writeln!(stdout, "{}", result.as_json()).map_err(AppError::WriteOutput)?;
    stdout.flush().map_err(AppError::WriteOutput)
}

fn build_request(command: CliCommand) -> Result<Request, AppError> {
    let request = match command {
        CliCommand::List => Request::list(),
        CliCommand::Register { name, state } => {
            Request::register(name, parse_json("state", &state)?)
        }
        CliCommand::State { action } => match action {
            StateAction::Get { name } => Request::get_state(name),
            StateAction::Set { name, state, token } => Request::set_state(
                name,
                &DriverToken::new(token),
                parse_json("state", &state)?,
            ),
        },
        CliCommand::Status { action } => match action {
            StatusAction::Get { name } => Request::get_status(name),
            StatusAction::Set {
                name,
                status,
                token,
            } => Request::set_status(name, &DriverToken::new(token), status),
        },
        CliCommand::Operation { name, token } => {
            Request::get_operation(name, &DriverToken::new(token))
        }
        CliCommand::Dispatch { name, op, arg } => {
            let mut operation = Operation::new(op);
            if let Some(arg) = arg {
                operation = operation.with_arg(parse_json("operation argument", &arg)?);
            }
            Request::dispatch(name, operation)
        }
        CliCommand::Disconnect { name, token } => {
            Request::disconnect(name, &DriverToken::new(token))
        }
    };
    Ok(request)
}

fn parse_json(what: &'static str, text: &str) -> Result<Payload, AppError> {
    Payload::parse(text).map_err(|source| AppError::InvalidJson { what, source })
}
