#![forbid(unsafe_code)]

//! qrv — Quality Report Viewer CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        eprintln!("qrv: {e}");
        std::process::exit(1);
    }
}
