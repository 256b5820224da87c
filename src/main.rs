//! Spoke CLI - Jekyll posts to one repository per post

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = spoke_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
