#[tokio::main]
async fn main() -> std::io::Result<()> {
    parking_backend::run().await
}
