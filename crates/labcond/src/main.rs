use std::process::ExitCode;

fn main() -> ExitCode {
    match labcond::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed yet, so report directly.
            eprintln!("labcond: {error}");
            ExitCode::FAILURE
        }
    }
}
