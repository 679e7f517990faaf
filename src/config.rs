//! Harness configuration
//!
//! Built-in defaults, then a JSON file, then environment variables, then CLI
//! flags (applied by the binary). Credentials live here instead of being read
//! from ambient state by the flows.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::browser::BrowserKind;
use crate::errors::{HarnessError, Result};
use crate::locators::{LocatorRegistry, Selector};
use crate::money::Currency;
use crate::types::{MatchStrategy, ViewportSize};
use crate::wait::WaitPolicy;

/// Test account used by every flow that logs in
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the storefront lives and how its pages are addressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub home_path: String,
    pub login_path: String,
    pub cart_path: String,
    /// Any URL containing this (other than the cart itself) is the checkout flow
    pub checkout_fragment: String,
    /// Where a successful checkout handoff lands
    pub shipping_fragment: String,
    /// Substring every storefront page title carries
    pub title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            base_url: "https://www.periplus.com".to_string(),
            home_path: "/".to_string(),
            login_path: "/account/Login".to_string(),
            cart_path: "/checkout/cart".to_string(),
            checkout_fragment: "checkout".to_string(),
            shipping_fragment: "checkout/shipping_address".to_string(),
            title: "Periplus".to_string(),
        }
    }
}

impl SiteConfig {
    fn join(&self, path: &str) -> Result<String> {
        let base = Url::parse(&self.base_url).map_err(|e| {
            HarnessError::Config(format!("Invalid base URL '{}': {}", self.base_url, e))
        })?;
        let url = base
            .join(path)
            .map_err(|e| HarnessError::Config(format!("Invalid path '{}': {}", path, e)))?;
        Ok(url.to_string())
    }

    pub fn home_url(&self) -> Result<String> {
        self.join(&self.home_path)
    }

    pub fn login_url(&self) -> Result<String> {
        self.join(&self.login_path)
    }

    pub fn cart_url(&self) -> Result<String> {
        self.join(&self.cart_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub kind: BrowserKind,
    pub headless: bool,
    /// Window size; maximized when unset
    pub viewport: Option<ViewportSize>,
    /// Connect to this WebDriver instead of finding or starting one
    pub webdriver_url: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        BrowserConfig {
            kind: BrowserKind::Chrome,
            headless: true,
            viewport: None,
            webdriver_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        let policy = WaitPolicy::default();
        WaitConfig {
            timeout_secs: policy.timeout.as_secs(),
            poll_interval_ms: policy.poll_interval.as_millis() as u64,
        }
    }
}

impl WaitConfig {
    pub fn policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_millis(self.poll_interval_ms),
        )
    }
}

/// Rules the cart page object verifies against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartRules {
    pub currency: Currency,
    /// How a cart row's name is matched against the product searched for
    pub name_match: MatchStrategy,
    /// How the subtotal text is matched against the expected total
    pub total_match: MatchStrategy,
    /// Remove-control clicks allowed while emptying the cart
    pub removal_attempt_limit: usize,
    pub empty_cart_message: String,
}

impl Default for CartRules {
    fn default() -> Self {
        CartRules {
            currency: Currency::default(),
            name_match: MatchStrategy::Contains,
            total_match: MatchStrategy::Contains,
            removal_attempt_limit: 20,
            empty_cart_message: "Your shopping cart is empty".to_string(),
        }
    }
}

/// Product titles the scenarios search for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub primary: String,
    pub secondary: String,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog {
            primary: "Atomic Habits".to_string(),
            secondary: "Sunrise on the Reaping".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub credentials: Option<Credentials>,
    pub site: SiteConfig,
    pub browser: BrowserConfig,
    pub wait: WaitConfig,
    pub cart: CartRules,
    pub products: Catalog,
    /// `"<page>.<role>"` → replacement selector chain
    pub locators: BTreeMap<String, Vec<Selector>>,
}

impl HarnessConfig {
    /// `~/.cartprobe/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".cartprobe").join("config.json"))
    }

    /// Defaults, overlaid with `path` (or the default file if it exists), then the environment
    ///
    /// Not validated: callers layer their own overrides and then call [`validate`](Self::validate).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => HarnessConfig::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let raw = fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| HarnessError::Config(format!("Invalid {}: {}", path.display(), e)))
    }

    /// Overlay environment variables, looked up through `lookup`
    ///
    /// `CARTPROBE_EMAIL`/`CARTPROBE_PASSWORD` win over `TEST_EMAIL`/`TEST_PASSWORD`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // An empty variable counts as unset, so it never hides its fallback
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let pick = |primary: &str, fallback: &str| var(primary).or_else(|| var(fallback));

        let email = pick("CARTPROBE_EMAIL", "TEST_EMAIL");
        let password = pick("CARTPROBE_PASSWORD", "TEST_PASSWORD");
        if email.is_some() || password.is_some() {
            let current = self.credentials.take();
            let (old_email, old_password) = match current {
                Some(c) => (Some(c.email), Some(c.password)),
                None => (None, None),
            };
            if let (Some(email), Some(password)) = (email.or(old_email), password.or(old_password))
            {
                debug!("Using credentials for {}", email);
                self.credentials = Some(Credentials { email, password });
            }
        }

        if let Some(base_url) = var("CARTPROBE_BASE_URL") {
            self.site.base_url = base_url;
        }
        if let Some(url) = var("CARTPROBE_WEBDRIVER_URL") {
            self.browser.webdriver_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.site.home_url()?;
        if self.wait.timeout_secs == 0 {
            return Err(HarnessError::Config("wait.timeout_secs must be positive".into()));
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(HarnessError::Config(
                "wait.poll_interval_ms must be positive".into(),
            ));
        }
        if self.cart.removal_attempt_limit == 0 {
            return Err(HarnessError::Config(
                "cart.removal_attempt_limit must be positive".into(),
            ));
        }
        self.registry()?;
        Ok(())
    }

    pub fn require_credentials(&self) -> Result<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            HarnessError::Config(
                "No test account configured. Set CARTPROBE_EMAIL and CARTPROBE_PASSWORD \
                 (or TEST_EMAIL/TEST_PASSWORD), or add \"credentials\" to the config file"
                    .to_string(),
            )
        })
    }

    /// Default registry with this config's overrides applied
    pub fn registry(&self) -> Result<LocatorRegistry> {
        LocatorRegistry::periplus().with_overrides(&self.locators)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
