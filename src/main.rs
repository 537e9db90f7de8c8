use std::process::ExitCode;

fn main() -> ExitCode {
    docsmith::cli::run()
}
