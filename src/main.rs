use std::process::ExitCode;

fn main() -> ExitCode {
    match tierfetch::cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
