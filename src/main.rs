use bakery_smoke::runner::{SmokeRunner, DEFAULT_BASE_URL};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init();

    let mut runner = match SmokeRunner::new(DEFAULT_BASE_URL) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("could not set up smoke runner: {err}");
            return ExitCode::FAILURE;
        }
    };

    if runner.run_all().await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
