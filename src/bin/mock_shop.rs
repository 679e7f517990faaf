// Standalone mock bookstore for trying the harness locally
//
//   cargo run --features mock-shop --bin mock-shop -- 3000
//   CARTPROBE_EMAIL=buyer@example.com CARTPROBE_PASSWORD=correct-horse \
//       cartprobe run --base-url http://127.0.0.1:3000 --format simple

#![allow(dead_code)]

use std::net::SocketAddr;
use tracing::{Level, info};

// Include the shared mock shop module
include!("../../tests/mock_shop_app.rs");

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let app = create_app().await;

    // Parse port from args or use default
    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");

    info!(
        "Mock shop listening on http://{} (login: {} / {})",
        addr, SHOP_EMAIL, SHOP_PASSWORD
    );

    axum::serve(listener, app).await.expect("Server failed");
}
