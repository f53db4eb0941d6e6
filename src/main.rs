use clap::Parser;
use sigmatrader::cli::{init, run, Cli};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let config = match init(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    run(cli, &config)
}
