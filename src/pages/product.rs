use std::time::Duration;

use tracing::{debug, info};

use crate::errors::{HarnessError, Result};
use crate::locators::{Page, Role};
use crate::session::Session;
use crate::wait::Probe;

/// Product detail URLs look like `/p/<isbn>/<slug>`
const PRODUCT_PATH_MARKER: &str = "/p/";

/// The add-to-cart overlay clears quickly or not at all
const OVERLAY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ProductDetailPage<'a> {
    session: &'a Session,
}

impl<'a> ProductDetailPage<'a> {
    pub fn new(session: &'a Session) -> Self {
        ProductDetailPage { session }
    }

    /// Open the first product in the search results grid
    pub async fn click_first_product(&self) -> Result<String> {
        let browser = self.session.browser();
        let links = self
            .session
            .find_all(Page::ProductDetail, Role::ProductLink)
            .await?;
        let first = links.into_iter().next().ok_or_else(|| {
            HarnessError::NotFound("no products in the search results grid".to_string())
        })?;

        let href = browser.attribute(&first, "href").await?.unwrap_or_default();
        info!("Product found: {}. Clicking on it", href);
        browser.click(&first, &Role::ProductLink.label()).await?;

        let url = self
            .session
            .wait()
            .until_url_contains(browser, PRODUCT_PATH_MARKER, None)
            .await?;
        info!("Navigated to product detail page {}", url);
        Ok(url)
    }

    /// Set the quantity input before adding to cart
    pub async fn set_quantity(&self, quantity: u32) -> Result<()> {
        let browser = self.session.browser();
        let input = self
            .session
            .visible(Page::ProductDetail, Role::QuantityInput, None)
            .await?;

        let wanted = quantity.to_string();
        browser.set_value(&input, &wanted).await?;
        browser.press_enter(&input).await?;
        browser.dispatch_change(&input).await?;
        debug!("Quantity input set, change dispatched");

        let input = &input;
        let wanted = wanted.as_str();
        self.session
            .wait()
            .poll(
                &format!("quantity input to read {}", quantity),
                None,
                || async move {
                    if browser.value_of(input).await?.trim() == wanted {
                        Ok(Probe::Ready(()))
                    } else {
                        Ok(Probe::Pending)
                    }
                },
            )
            .await?;
        info!("Set product quantity to {}", quantity);
        Ok(())
    }

    /// Click add-to-cart and wait for the loading overlay to clear
    pub async fn click_add_to_cart(&self) -> Result<()> {
        self.session
            .click(Page::ProductDetail, Role::AddToCartButton)
            .await?;
        info!("Add to Cart button clicked");

        let overlay = self
            .session
            .locator(Page::ProductDetail, Role::LoadingOverlay)?;
        self.session
            .wait()
            .until_invisible(self.session.browser(), overlay, Some(OVERLAY_TIMEOUT))
            .await?;
        debug!("Loading overlay cleared");
        Ok(())
    }

    /// Displayed price in whole currency units
    pub async fn product_price(&self) -> Result<u64> {
        let element = self
            .session
            .visible(Page::ProductDetail, Role::ProductPrice, None)
            .await?;
        let text = self.session.browser().text_of(&element).await?;
        let price = self.session.rules().currency.parse(&text)?;
        info!("Product price is {} ({})", price, text);
        Ok(price)
    }
}
