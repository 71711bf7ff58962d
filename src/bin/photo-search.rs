use photo_search::console;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    console::run().await
}
