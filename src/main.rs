#[tokio::main]
async fn main() -> std::io::Result<()> {
    brain_heist_server::run_with_config().await
}
