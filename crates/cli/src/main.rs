use std::process::ExitCode;

fn main() -> ExitCode {
    tallerbot_cli::run()
}
