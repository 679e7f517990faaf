// Mock bookstore server for integration tests

use std::net::SocketAddr;
use tokio::sync::OnceCell;

// Include the mock shop app inline
include!("mock_shop_app.rs");

static MOCK_SHOP: OnceCell<MockShopHandle> = OnceCell::const_new();

pub struct MockShopHandle {
    pub addr: SocketAddr,
    pub base_url: String,
}

impl MockShopHandle {
    /// Empty the cart and log the shopper out
    pub async fn reset(&self) {
        reqwest::Client::new()
            .post(format!("{}/__reset", self.base_url))
            .send()
            .await
            .expect("Failed to reset mock shop");
    }

    /// Server-side view of the cart and login flag
    pub async fn state(&self) -> serde_json::Value {
        reqwest::Client::new()
            .get(format!("{}/__state", self.base_url))
            .send()
            .await
            .expect("Failed to query mock shop")
            .json()
            .await
            .expect("Mock shop state is not JSON")
    }
}

/// Start the mock shop once for all tests in this binary
pub async fn ensure_mock_shop() -> &'static MockShopHandle {
    MOCK_SHOP
        .get_or_init(|| async {
            let std_listener = std::net::TcpListener::bind("127.0.0.1:0")
                .expect("Failed to bind mock shop");
            let addr = std_listener.local_addr().unwrap();
            let base_url = format!("http://{}", addr);
            drop(std_listener);

            // Own thread and runtime so the server outlives each test's runtime
            let server_handle = std::thread::spawn(move || {
                let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");

                runtime.block_on(async {
                    let listener = tokio::net::TcpListener::bind(addr)
                        .await
                        .expect("Failed to bind in thread");
                    let app = create_app().await;
                    axum::serve(listener, app).await.expect("Mock shop failed");
                });
            });

            let client = reqwest::Client::new();
            for i in 0..30 {
                tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

                if let Ok(response) = client.get(&base_url).send().await
                    && response.status().is_success()
                {
                    eprintln!("Mock shop ready at {} after {} attempts", base_url, i + 1);
                    break;
                }

                if i == 29 {
                    panic!("Mock shop failed to start after 30 attempts");
                }
            }

            drop(server_handle);

            MockShopHandle { addr, base_url }
        })
        .await
}
