use std::process::ExitCode;

fn main() -> ExitCode {
    ExitCode::from(mdtd_cli::run())
}
