use std::path::PathBuf;

use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::driver_manager::GLOBAL_DRIVER_MANAGER;
use crate::errors::{CommandFault, HarnessError, Result, classify};
use crate::locators::ElementLocator;

/// WebDriver "Enter" key code point
const ENTER_KEY: &str = "\u{e007}";

/// Supported browser types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Google Chrome/Chromium
    Chrome,
    /// Mozilla Firefox
    Firefox,
}

impl std::str::FromStr for BrowserKind {
    type Err = HarnessError;

    /// Parse browser type from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserKind::Firefox),
            "chrome" | "chromium" => Ok(BrowserKind::Chrome),
            _ => Err(HarnessError::Config(format!("Unsupported browser: {}", s))),
        }
    }
}

impl BrowserKind {
    pub fn driver_command(&self) -> &'static str {
        match self {
            BrowserKind::Firefox => "geckodriver",
            BrowserKind::Chrome => "chromedriver",
        }
    }

    /// Port the driver listens on when started by hand
    pub fn standard_port(&self) -> u16 {
        match self {
            BrowserKind::Firefox => 4444,
            BrowserKind::Chrome => 9515,
        }
    }
}

/// How a click was finally delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMethod {
    Native,
    /// Dispatched through script after the native click was intercepted
    Forced,
}

/// One WebDriver session
pub struct Browser {
    client: Client,
    kind: BrowserKind,
    _profile_dir: Option<tempfile::TempDir>,
}

impl Browser {
    /// Launch a browser session
    ///
    /// Uses `config.webdriver_url` when set, otherwise finds or starts a local driver.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let kind = config.kind;
        info!("Connecting to {:?} WebDriver", kind);

        let webdriver_url = match &config.webdriver_url {
            Some(url) => url.clone(),
            None => GLOBAL_DRIVER_MANAGER.ensure_driver(kind).await?,
        };

        // Chrome refuses to share a user-data-dir between sessions
        let profile_dir = match kind {
            BrowserKind::Chrome => Some(
                tempfile::Builder::new()
                    .prefix("cartprobe-chrome-")
                    .tempdir()
                    .map_err(|e| HarnessError::Other(e.into()))?,
            ),
            BrowserKind::Firefox => None,
        };
        let caps = capabilities(
            config,
            profile_dir.as_ref().map(|dir| dir.path().to_path_buf()),
        );

        debug!("Connecting to WebDriver at {}", webdriver_url);

        let client = match ClientBuilder::rustls()
            .capabilities(caps.clone())
            .connect(&webdriver_url)
            .await
        {
            Ok(client) => client,
            Err(e) => {
                let error_str = e.to_string();
                if config.webdriver_url.is_none()
                    && (error_str.contains("Session is already started")
                        || error_str.contains("session not created"))
                {
                    // Driver is wedged; restart it once
                    warn!("WebDriver appears to be in a bad state, restarting it");
                    GLOBAL_DRIVER_MANAGER.kill_driver(kind);
                    let new_url = GLOBAL_DRIVER_MANAGER.ensure_driver(kind).await?;

                    ClientBuilder::rustls()
                        .capabilities(caps)
                        .connect(&new_url)
                        .await
                        .map_err(|e| {
                            HarnessError::WebDriver(format!(
                                "Failed to connect to WebDriver after restart: {}",
                                e
                            ))
                        })?
                } else {
                    return Err(HarnessError::WebDriver(format!(
                        "Failed to connect to WebDriver at {}: {}",
                        webdriver_url, e
                    )));
                }
            }
        };

        if let Some(vp) = config.viewport {
            debug!("Setting window size to {}x{}", vp.width, vp.height);
            if let Err(e) = client.set_window_size(vp.width, vp.height).await {
                debug!("Could not set window size: {}", e);
            }
        }

        Ok(Browser {
            client,
            kind,
            _profile_dir: profile_dir,
        })
    }

    pub fn kind(&self) -> BrowserKind {
        self.kind
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.client.goto(url).await?;
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    pub async fn title(&self) -> Result<String> {
        let value = self.execute("return document.title;", vec![]).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        Ok(self.client.execute(script, args).await?)
    }

    /// All elements matching the first selector in the chain that matches anything
    pub async fn find_all(&self, locator: &ElementLocator) -> Result<Vec<Element>> {
        for selector in locator.selectors() {
            match self.client.find_all(selector.as_locator()).await {
                Ok(found) if !found.is_empty() => {
                    debug!("{} resolved via {} ({} match)", locator, selector, found.len());
                    return Ok(found);
                }
                Ok(_) => continue,
                Err(e) if classify(&e) == CommandFault::Missing => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Vec::new())
    }

    /// Like [`find_all`](Self::find_all), scoped to descendants of `scope`
    pub async fn find_all_within(
        &self,
        scope: &Element,
        locator: &ElementLocator,
    ) -> Result<Vec<Element>> {
        for selector in locator.selectors() {
            match scope.find_all(selector.as_locator()).await {
                Ok(found) if !found.is_empty() => return Ok(found),
                Ok(_) => continue,
                Err(e) if classify(&e) == CommandFault::Missing => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Vec::new())
    }

    /// First descendant of `scope` matching `locator`, or `NotFound`
    pub async fn find_within(&self, scope: &Element, locator: &ElementLocator) -> Result<Element> {
        self.find_all_within(scope, locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HarnessError::NotFound(locator.describe()))
    }

    pub async fn text_of(&self, element: &Element) -> Result<String> {
        Ok(element.text().await?.trim().to_string())
    }

    /// Live `value` property of an input
    pub async fn value_of(&self, element: &Element) -> Result<String> {
        let value = self
            .execute("return arguments[0].value;", vec![json!(element)])
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>> {
        Ok(element.attr(name).await?)
    }

    pub async fn type_into(&self, element: &Element, text: &str, clear: bool) -> Result<()> {
        if clear {
            element.clear().await?;
        }
        element.send_keys(text).await?;
        Ok(())
    }

    pub async fn press_enter(&self, element: &Element) -> Result<()> {
        element.send_keys(ENTER_KEY).await?;
        Ok(())
    }

    /// Set an input's value directly, bypassing key events
    pub async fn set_value(&self, element: &Element, value: &str) -> Result<()> {
        self.execute(
            "arguments[0].value = arguments[1];",
            vec![json!(element), json!(value)],
        )
        .await?;
        Ok(())
    }

    pub async fn dispatch_change(&self, element: &Element) -> Result<()> {
        self.execute(
            "arguments[0].dispatchEvent(new Event('change', { bubbles: true }));",
            vec![json!(element)],
        )
        .await?;
        Ok(())
    }

    pub async fn scroll_into_view(&self, element: &Element) -> Result<()> {
        self.execute(
            "arguments[0].scrollIntoView({block: 'center'});",
            vec![json!(element)],
        )
        .await?;
        Ok(())
    }

    /// Click through script, ignoring overlays and visibility
    pub async fn forced_click(&self, element: &Element) -> Result<()> {
        self.execute("arguments[0].click();", vec![json!(element)])
            .await?;
        Ok(())
    }

    /// Native click, falling back to [`forced_click`](Self::forced_click) when intercepted
    pub async fn click(&self, element: &Element, label: &str) -> Result<ClickMethod> {
        self.scroll_into_view(element).await?;
        match element.click().await {
            Ok(()) => {
                debug!("Clicked {} using normal click", label);
                Ok(ClickMethod::Native)
            }
            Err(e) if classify(&e) == CommandFault::ClickIntercepted => {
                let intercepted = HarnessError::ClickIntercepted(label.to_string());
                warn!("{} ({}), retrying with script click", intercepted, e);
                self.forced_click(element).await?;
                Ok(ClickMethod::Forced)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

/// WebDriver capabilities for a session
pub(crate) fn capabilities(
    config: &BrowserConfig,
    profile_dir: Option<PathBuf>,
) -> serde_json::Map<String, Value> {
    let mut caps = serde_json::Map::new();

    match config.kind {
        BrowserKind::Firefox => {
            let mut args = Vec::new();
            if config.headless {
                args.push("--headless".to_string());
            }
            if let Some(vp) = &config.viewport {
                args.push(format!("--width={}", vp.width));
                args.push(format!("--height={}", vp.height));
            }
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
        BrowserKind::Chrome => {
            let mut args = vec![
                "--no-sandbox".to_string(),
                "--disable-notifications".to_string(),
                "--disable-popup-blocking".to_string(),
                "--disable-web-security".to_string(),
                "--allow-running-insecure-content".to_string(),
            ];

            if config.headless {
                args.push("--headless=new".to_string());
                args.push("--disable-gpu".to_string());
                args.push("--disable-dev-shm-usage".to_string());
            }

            match &config.viewport {
                Some(vp) => args.push(format!("--window-size={},{}", vp.width, vp.height)),
                None => args.push("--start-maximized".to_string()),
            }

            if let Some(dir) = profile_dir {
                args.push(format!("--user-data-dir={}", dir.display()));
            }

            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
    }

    caps
}

#[cfg(test)]
#[path = "browser_test.rs"]
mod browser_test;
