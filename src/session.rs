use std::time::Duration;

use fantoccini::elements::Element;
use tracing::{debug, info};

use crate::browser::{Browser, ClickMethod};
use crate::config::{CartRules, HarnessConfig, SiteConfig};
use crate::errors::Result;
use crate::locators::{ElementLocator, LocatorRegistry, Page, Role};
use crate::wait::WaitPolicy;

/// One browser plus everything page objects need to drive it
///
/// Created once per run and shared by reference with every page object.
pub struct Session {
    browser: Browser,
    wait: WaitPolicy,
    locators: LocatorRegistry,
    site: SiteConfig,
    rules: CartRules,
}

impl Session {
    /// Launch a browser for `config`
    pub async fn start(config: &HarnessConfig) -> Result<Self> {
        let locators = config.registry()?;
        let browser = Browser::launch(&config.browser).await?;
        info!(
            "Session started ({:?}, headless: {})",
            browser.kind(),
            config.browser.headless
        );
        Ok(Self::with_browser(browser, config, locators))
    }

    pub(crate) fn with_browser(
        browser: Browser,
        config: &HarnessConfig,
        locators: LocatorRegistry,
    ) -> Self {
        Session {
            browser,
            wait: config.wait.policy(),
            locators,
            site: config.site.clone(),
            rules: config.cart.clone(),
        }
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    pub fn wait(&self) -> &WaitPolicy {
        &self.wait
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub fn rules(&self) -> &CartRules {
        &self.rules
    }

    pub fn locator(&self, page: Page, role: Role) -> Result<&ElementLocator> {
        self.locators.get(page, role)
    }

    /// Load `url` and wait for the document to finish loading
    pub async fn open(&self, url: &str) -> Result<()> {
        self.browser.goto(url).await?;
        self.wait.until_document_ready(&self.browser, None).await
    }

    pub async fn visible(
        &self,
        page: Page,
        role: Role,
        timeout: Option<Duration>,
    ) -> Result<Element> {
        let locator = self.locator(page, role)?;
        self.wait.until_visible(&self.browser, locator, timeout).await
    }

    pub async fn clickable(&self, page: Page, role: Role) -> Result<Element> {
        let locator = self.locator(page, role)?;
        self.wait.until_clickable(&self.browser, locator, None).await
    }

    /// Wait until clickable, then click with the intercept fallback
    pub async fn click(&self, page: Page, role: Role) -> Result<ClickMethod> {
        let element = self.clickable(page, role).await?;
        self.browser.click(&element, &role.label()).await
    }

    /// Elements currently matching, without waiting
    pub async fn find_all(&self, page: Page, role: Role) -> Result<Vec<Element>> {
        let locator = self.locator(page, role)?;
        self.browser.find_all(locator).await
    }

    pub async fn close(self) -> Result<()> {
        debug!("Closing session");
        self.browser.close().await
    }
}
