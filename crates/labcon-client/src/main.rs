//! Entry point for the `labcon` control CLI.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    labcon_client::run(std::env::args_os(), &mut stdout, &mut stderr)
}
