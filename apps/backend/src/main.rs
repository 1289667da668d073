#[tokio::main]
async fn main() -> anyhow::Result<()> {
    progression_backend::run().await
}
