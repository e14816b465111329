use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    refscope_cli::main_entry().await
}
