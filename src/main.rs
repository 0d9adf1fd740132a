use clap::Parser;
use ghcn_anomaly::cli::{run, Cli};
use ghcn_anomaly::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
