#[tokio::main]
async fn main() {
    medscribe_relay::setup_logging();

    if let Err(e) = medscribe_relay::run().await {
        log::error!("Failed to run medscribe-relay: {}", e);
        eprintln!("Failed to run medscribe-relay: {}", e);
        std::process::exit(1);
    }
}
