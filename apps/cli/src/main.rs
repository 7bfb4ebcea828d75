//! living-doc CLI: normalize living-documentation producer exports.
//!
//! Reads a producer's JSON export, maps it onto canonical user stories with
//! normalized Markdown sections and an audit trail, and writes a PDF-ready
//! JSON document.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);

    match commands::run(cli).await {
        Ok(()) => Ok(()),
        Err(report) => match commands::classify(&report) {
            Some((code, message)) => {
                tracing::debug!(exit_code = code, "{report}");
                eprintln!("{message}");
                std::process::exit(code);
            }
            None => Err(report),
        },
    }
}
