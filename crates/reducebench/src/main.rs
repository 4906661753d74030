use std::process::ExitCode;

use reducebench::{config::Settings, create_context, error::BenchError, oracle::HostOracle, run};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match bench() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.diagnostic());
            ExitCode::FAILURE
        }
    }
}

fn bench() -> Result<(), BenchError> {
    let settings = Settings::load()?;
    let context = create_context(&settings)?;
    let mut oracle = HostOracle::new(settings.bench.seed);

    run(&settings, &context, &mut oracle, std::io::stdout().lock())
}
