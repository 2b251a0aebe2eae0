use std::net::SocketAddr;
use std::str::FromStr;

use aquatrack::mock::{MOCK_USERS, MockTrackerServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8000".to_string());
    let addr = SocketAddr::from_str(&addr)?;
    let handle = MockTrackerServer::start(addr).await?;
    let tokens: Vec<&str> = MOCK_USERS.iter().map(|(token, ..)| *token).collect();
    println!(
        "mock tracker server listening on {} (session cookies: {})",
        handle.url(),
        tokens.join(", ")
    );
    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;
    Ok(())
}
