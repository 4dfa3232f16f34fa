//! Command-line interface definitions for `labcon`.

use clap::{Parser, Subcommand};

use labcon_types::DriverStatus;

/// Control client for the lab controller daemon.
///
/// Configuration flags (`--daemon-socket`, `--config-path`, ...) must come
/// before the subcommand.
#[derive(Parser, Debug)]
#[command(name = "labcon", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Lists registered drivers.
    List,
    /// Registers a driver and prints its token.
    Register {
        name: String,
        #[arg(value_name = "STATE_JSON")]
        state: String,
    },
    /// Reads or replaces a driver's state.
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Reads or sets a driver's status.
    Status {
        #[command(subcommand)]
        action: StatusAction,
    },
    /// Prints a driver's pending operation, or `null`.
    Operation {
        name: String,
        #[arg(long)]
        token: String,
    },
    /// Assigns an operation to an idle driver.
    Dispatch {
        name: String,
        #[arg(value_name = "OP")]
        op: String,
        /// Operation argument as JSON.
        #[arg(long, value_name = "JSON")]
        arg: Option<String>,
    },
    /// Removes a driver from the registry.
    Disconnect {
        name: String,
        #[arg(long)]
        token: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum StateAction {
    /// Prints the driver's state.
    Get { name: String },
    /// Replaces the driver's state.
    Set {
        name: String,
        #[arg(value_name = "STATE_JSON")]
        state: String,
        #[arg(long)]
        token: String,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum StatusAction {
    /// Prints the driver's status.
    Get { name: String },
    /// Sets the driver's status (`idle`, `busy`, `lost`, `error`).
    Set {
        name: String,
        status: DriverStatus,
        #[arg(long)]
        token: String,
    },
}
