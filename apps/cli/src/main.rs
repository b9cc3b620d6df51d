mod args;
mod config;
mod main_lib;
mod render;
mod roster;

use clap::Parser;

use args::Cli;
use config::Config;
use main_lib::{init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    init_tracing();
    run(cli, config).await
}
