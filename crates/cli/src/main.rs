use std::process::ExitCode;

fn main() -> ExitCode {
    requestdesk_cli::run()
}
