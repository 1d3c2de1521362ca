use clap::Parser;

use holdsense_lib::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    holdsense_lib::run(Cli::parse()).await
}
