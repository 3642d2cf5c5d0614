use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    unoq_link::cli::run().await
}
