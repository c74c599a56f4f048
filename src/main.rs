use std::process::ExitCode;

use particle_interop::config::{CONTROLS, USAGE};
use particle_interop::{parse_args, CliError};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let system = match parse_args(std::env::args().skip(1)) {
        Ok(system) => system,
        Err(CliError::HelpRequested) => {
            println!("{USAGE}\n\n{CONTROLS}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {e}\n{USAGE}\n\n{CONTROLS}");
            return ExitCode::from(2);
        }
    };

    log::info!("particle-interop {}", env!("CARGO_PKG_VERSION"));
    println!("{CONTROLS}");

    match system.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}: {e}", e.category());
            ExitCode::FAILURE
        }
    }
}
