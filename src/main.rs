use std::process::ExitCode;

fn main() -> ExitCode {
    indexgate::run()
}
