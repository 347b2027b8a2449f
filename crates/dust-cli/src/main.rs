use clap::Parser;
use dust_cli::{Cli, run};
use dust_core::{LoggingDestination, init_logging};

#[tokio::main]
async fn main() {
    if let Err(err) = init_logging(LoggingDestination::FileAndStderr) {
        eprintln!("Warning: structured logging unavailable: {err}");
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(output) => print!("{output}"),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
