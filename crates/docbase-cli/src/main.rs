//! The `docbase` binary.

use clap::Parser;
use docbase_cli::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    docbase_cli::run(CliArgs::parse()).await
}
