#[tokio::main]
async fn main() {
    if let Err(e) = studioboard_server::run().await {
        eprintln!("studioboard: {}", e);
        std::process::exit(1);
    }
}
