//! huddle-web: HTTP server for the huddle chat store.

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    huddle::web_client::run().await
}
