//! lambda-factory: scaffold a function project and register it with AWS Lambda.

fn main() -> std::process::ExitCode {
    lfhelper_cli::main()
}
