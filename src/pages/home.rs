use tracing::{debug, info};

use crate::errors::Result;
use crate::locators::{Page, Role};
use crate::session::Session;

pub struct HomePage<'a> {
    session: &'a Session,
}

impl<'a> HomePage<'a> {
    pub fn new(session: &'a Session) -> Self {
        HomePage { session }
    }

    /// Load the home page and wait for the site title
    pub async fn navigate(&self) -> Result<()> {
        let site = self.session.site();
        self.session.open(&site.home_url()?).await?;
        self.session
            .wait()
            .until_title_contains(self.session.browser(), &site.title, None)
            .await?;
        info!("Navigated to home page");
        Ok(())
    }

    /// Submit `term` through the search box and wait for the results grid
    pub async fn search_for_product(&self, term: &str) -> Result<()> {
        let browser = self.session.browser();

        let search_box = self.session.visible(Page::Home, Role::SearchBox, None).await?;
        browser.type_into(&search_box, term, true).await?;
        info!("Search term '{}' entered", term);

        self.session.click(Page::Home, Role::SearchButton).await?;
        debug!("Search submitted");

        self.session
            .visible(Page::Home, Role::ProductGrid, None)
            .await?;
        info!("Search results for '{}' are visible", term);
        Ok(())
    }

    /// Log out of the storefront
    ///
    /// The logout link usually sits in a collapsed account menu, so it is
    /// clicked through script. Done once the page holding the link is replaced.
    pub async fn logout(&self) -> Result<()> {
        let browser = self.session.browser();
        let wait = self.session.wait();
        let locator = self.session.locator(Page::Home, Role::LogoutLink)?;

        let link = wait.until_present(browser, locator, None).await?;
        if let Some(href) = browser.attribute(&link, "href").await? {
            debug!("Logout link points at {}", href);
        }
        browser.forced_click(&link).await?;
        wait.until_stale(&link, &Role::LogoutLink.label(), None).await?;
        wait.until_document_ready(browser, None).await?;
        info!("Logged out");
        Ok(())
    }
}
