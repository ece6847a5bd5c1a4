#[tokio::main]
async fn main() {
    if let Err(err) = phishguard::run().await {
        eprintln!("phishguard failed to start: {}", err);
        std::process::exit(1);
    }
}
