mod shim;
mod ui;

use crate::ui::cli;
use authmux_core::utils::logging::init_logging;
use clap::Parser;

#[tokio::main]
async fn main() {
    init_logging();
    let args = cli::Args::parse();
    if let Err(e) = cli::run_cli(args).await {
        let code = e.exit_code();
        if !matches!(e, authmux_core::Error::ExitCode(_)) {
            eprintln!("Error: {e}");
        }
        std::process::exit(code);
    }
}
