use anyhow::Result;
use huddle::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
