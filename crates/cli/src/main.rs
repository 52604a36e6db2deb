use std::process::ExitCode;

fn main() -> ExitCode {
    trekdesk_cli::run()
}
