//! fleettally CLI: census reports over regional fleet spreadsheets.
//!
//! Pulls every configured region's sheet, normalizes the rows and prints
//! ranked summaries as text tables or JSON.

mod commands;
mod report;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
