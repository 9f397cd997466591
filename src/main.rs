use csg_scenes::app::run_cli;
use csg_scenes::io::cli::Cli;
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let result = Cli::process().and_then(|(cli, config)| run_cli(&cli, &config));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
