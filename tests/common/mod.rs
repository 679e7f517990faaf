// Shared helpers for browser-backed integration tests

use std::sync::Arc;
use tokio::sync::Mutex;

use cartprobe::{BrowserKind, Credentials, HarnessConfig, Session};

use crate::mock_shop::{SHOP_EMAIL, SHOP_PASSWORD};

// Global test lock to prevent concurrent WebDriver starts
lazy_static::lazy_static! {
    static ref WEBDRIVER_LOCK: Arc<Mutex<()>> = Arc::new(Mutex::new(()));
}

/// Harness config pointed at the mock shop, with short waits
pub fn shop_config(base_url: &str) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.site.base_url = base_url.to_string();
    config.credentials = Some(Credentials {
        email: SHOP_EMAIL.to_string(),
        password: SHOP_PASSWORD.to_string(),
    });
    config.wait.timeout_secs = 10;
    config.wait.poll_interval_ms = 100;
    if let Ok(url) = std::env::var("CARTPROBE_WEBDRIVER_URL") {
        config.browser.webdriver_url = Some(url);
    }
    config
}

/// Start a browser session, or `None` when no browser/driver is installed
pub async fn start_session(config: &HarnessConfig) -> Option<Session> {
    let _lock = WEBDRIVER_LOCK.lock().await;

    // Chrome first (more reliable for localhost), then Firefox
    for kind in [BrowserKind::Chrome, BrowserKind::Firefox] {
        let mut config = config.clone();
        config.browser.kind = kind;

        for attempt in 1..=2 {
            match Session::start(&config).await {
                Ok(session) => {
                    eprintln!("Created {:?} session on attempt {}", kind, attempt);
                    return Some(session);
                }
                Err(e) => eprintln!("Attempt {} failed for {:?}: {}", attempt, kind, e),
            }
        }
    }

    eprintln!("WARNING: Could not create a browser session, skipping browser test");
    None
}
