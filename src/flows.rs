//! End-to-end shopping scenarios composed from the page objects
//!
//! A [`Storefront`] drives one session through the add-to-cart flow and
//! remembers how far the current scenario got. Each [`Scenario`] is
//! self-contained: it puts whatever it needs into the cart itself, so any
//! subset can run in any order as long as the cart starts empty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::HarnessConfig;
use crate::errors::{HarnessError, Result};
use crate::pages::{CartState, HomePage, LoginPage, ProductDetailPage, ShoppingCartPage};
use crate::session::Session;

/// Last step a flow completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    NotOnPage,
    Navigated,
    Authenticated,
    SearchSubmitted,
    ResultsVisible,
    ProductOpened,
    QuantitySet,
    AddedToCart,
    CartOpened,
    CartUpdated,
    LoggedOut,
    CheckedOut,
    Verified,
}

impl FlowStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStage::NotOnPage => "not on page",
            FlowStage::Navigated => "navigated",
            FlowStage::Authenticated => "authenticated",
            FlowStage::SearchSubmitted => "search submitted",
            FlowStage::ResultsVisible => "results visible",
            FlowStage::ProductOpened => "product opened",
            FlowStage::QuantitySet => "quantity set",
            FlowStage::AddedToCart => "added to cart",
            FlowStage::CartOpened => "cart opened",
            FlowStage::CartUpdated => "cart updated",
            FlowStage::LoggedOut => "logged out",
            FlowStage::CheckedOut => "checked out",
            FlowStage::Verified => "verified",
        }
    }
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scenarios the suite knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Scenario {
    #[serde(rename = "navigate-home")]
    #[value(name = "navigate-home")]
    NavigateHome,
    #[serde(rename = "cart-001")]
    #[value(name = "cart-001")]
    SingleProduct,
    #[serde(rename = "cart-002")]
    #[value(name = "cart-002")]
    QuantityOnProductPage,
    #[serde(rename = "cart-003")]
    #[value(name = "cart-003")]
    TwoProducts,
    #[serde(rename = "cart-004")]
    #[value(name = "cart-004")]
    UpdateQuantityInCart,
    #[serde(rename = "cart-005")]
    #[value(name = "cart-005")]
    RemoveOneProduct,
    #[serde(rename = "cart-006")]
    #[value(name = "cart-006")]
    EmptyCart,
    #[serde(rename = "cart-007")]
    #[value(name = "cart-007")]
    PersistAfterRelogin,
    #[serde(rename = "cart-008")]
    #[value(name = "cart-008")]
    ProceedToCheckout,
    #[serde(rename = "cart-009")]
    #[value(name = "cart-009")]
    DoubleAdd,
}

impl Scenario {
    pub const ALL: [Scenario; 10] = [
        Scenario::NavigateHome,
        Scenario::SingleProduct,
        Scenario::QuantityOnProductPage,
        Scenario::TwoProducts,
        Scenario::UpdateQuantityInCart,
        Scenario::RemoveOneProduct,
        Scenario::EmptyCart,
        Scenario::PersistAfterRelogin,
        Scenario::ProceedToCheckout,
        Scenario::DoubleAdd,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Scenario::NavigateHome => "navigate-home",
            Scenario::SingleProduct => "cart-001",
            Scenario::QuantityOnProductPage => "cart-002",
            Scenario::TwoProducts => "cart-003",
            Scenario::UpdateQuantityInCart => "cart-004",
            Scenario::RemoveOneProduct => "cart-005",
            Scenario::EmptyCart => "cart-006",
            Scenario::PersistAfterRelogin => "cart-007",
            Scenario::ProceedToCheckout => "cart-008",
            Scenario::DoubleAdd => "cart-009",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Scenario::NavigateHome => "Home page loads",
            Scenario::SingleProduct => "Add single product to cart",
            Scenario::QuantityOnProductPage => "Add multiple quantities of the same product",
            Scenario::TwoProducts => "Add multiple different products",
            Scenario::UpdateQuantityInCart => "Update product quantity in cart",
            Scenario::RemoveOneProduct => "Remove product from cart",
            Scenario::EmptyCart => "Empty cart",
            Scenario::PersistAfterRelogin => "Cart persists after re-login",
            Scenario::ProceedToCheckout => "Proceed to checkout",
            Scenario::DoubleAdd => "Adding the same product twice increments quantity",
        }
    }

    /// Whether the scenario leaves items behind that the suite must clear
    pub fn touches_cart(&self) -> bool {
        !matches!(self, Scenario::NavigateHome)
    }

    pub fn needs_login(&self) -> bool {
        self.touches_cart()
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Scenario {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        Scenario::ALL
            .iter()
            .copied()
            .find(|scenario| scenario.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| HarnessError::Config(format!("Unknown scenario: {}", s)))
    }
}

/// Page objects over one session, plus the progress of the running flow
pub struct Storefront<'a> {
    session: &'a Session,
    config: &'a HarnessConfig,
    home: HomePage<'a>,
    login: LoginPage<'a>,
    product: ProductDetailPage<'a>,
    cart: ShoppingCartPage<'a>,
    stage: FlowStage,
    authenticated: bool,
}

impl<'a> Storefront<'a> {
    pub fn new(session: &'a Session, config: &'a HarnessConfig) -> Self {
        Storefront {
            session,
            config,
            home: HomePage::new(session),
            login: LoginPage::new(session),
            product: ProductDetailPage::new(session),
            cart: ShoppingCartPage::new(session),
            stage: FlowStage::NotOnPage,
            authenticated: false,
        }
    }

    pub fn stage(&self) -> FlowStage {
        self.stage
    }

    pub fn cart(&self) -> &ShoppingCartPage<'a> {
        &self.cart
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Load the home page
    pub async fn navigate_home(&mut self) -> Result<()> {
        self.home.navigate().await?;
        self.stage = FlowStage::Navigated;
        Ok(())
    }

    /// Log in unless this session already did or the page shows an account session
    pub async fn ensure_logged_in(&mut self) -> Result<()> {
        if !self.authenticated && self.login.is_logged_in().await? {
            info!("Browser already has an account session");
            self.authenticated = true;
        }
        if !self.authenticated {
            let credentials = self.config.require_credentials()?;
            self.login.login(credentials).await?;
            self.authenticated = true;
        }
        self.stage = FlowStage::Authenticated;
        Ok(())
    }

    /// Home → login → search → first result → (quantity) → add to cart
    ///
    /// Returns the unit price shown on the product page.
    pub async fn add_product(&mut self, title: &str, quantity: Option<u32>) -> Result<u64> {
        self.navigate_home().await?;
        self.ensure_logged_in().await?;

        self.stage = FlowStage::SearchSubmitted;
        self.home.search_for_product(title).await?;
        self.stage = FlowStage::ResultsVisible;

        self.product.click_first_product().await?;
        self.stage = FlowStage::ProductOpened;
        let price = self.product.product_price().await?;

        if let Some(quantity) = quantity {
            self.product.set_quantity(quantity).await?;
            self.stage = FlowStage::QuantitySet;
        }

        self.product.click_add_to_cart().await?;
        self.stage = FlowStage::AddedToCart;
        info!(
            "Product titled '{}' with price {} added to cart",
            title,
            self.config.cart.currency.format(price)
        );
        Ok(price)
    }

    pub async fn open_cart(&mut self) -> Result<CartState> {
        let state = self.cart.navigate().await?;
        self.stage = FlowStage::CartOpened;
        Ok(state)
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.navigate_home().await?;
        self.home.logout().await?;
        self.authenticated = false;
        self.stage = FlowStage::LoggedOut;
        Ok(())
    }

    /// Run `scenario` inside its failure boundary
    ///
    /// Any failure is logged and returned wrapped with the scenario id and the
    /// last stage it completed.
    pub async fn execute(&mut self, scenario: Scenario) -> Result<()> {
        self.stage = FlowStage::NotOnPage;
        info!("Starting {}: {}", scenario.id(), scenario.title());

        match self.run(scenario).await {
            Ok(()) => {
                self.stage = FlowStage::Verified;
                info!("{} completed successfully", scenario.id());
                Ok(())
            }
            Err(e) => {
                error!("Error during {} at stage '{}': {}", scenario.id(), self.stage, e);
                Err(HarnessError::Scenario {
                    id: scenario.id().to_string(),
                    stage: self.stage,
                    source: Box::new(e),
                })
            }
        }
    }

    async fn run(&mut self, scenario: Scenario) -> Result<()> {
        let primary = self.config.products.primary.clone();
        let secondary = self.config.products.secondary.clone();

        match scenario {
            Scenario::NavigateHome => self.navigate_home().await,
            Scenario::SingleProduct => {
                let price = self.add_product(&secondary, None).await?;
                self.open_cart().await?;
                self.cart.verify_product_in_cart(&secondary, price, 1).await?;
                self.cart.verify_total_price(price).await
            }
            Scenario::QuantityOnProductPage => {
                let quantity = 3;
                let price = self.add_product(&primary, Some(quantity)).await?;
                self.open_cart().await?;
                self.cart
                    .verify_product_in_cart(&primary, price, quantity)
                    .await?;
                self.cart
                    .verify_total_price(price * u64::from(quantity))
                    .await
            }
            Scenario::TwoProducts => {
                let first = self.add_product(&secondary, None).await?;
                let second = self.add_product(&primary, None).await?;
                self.open_cart().await?;
                self.cart.verify_product_in_cart(&secondary, first, 1).await?;
                self.cart.verify_product_in_cart(&primary, second, 1).await?;
                self.cart.verify_total_price(first + second).await
            }
            Scenario::UpdateQuantityInCart => {
                let quantity = 2;
                self.add_product(&primary, None).await?;
                self.open_cart().await?;
                let price = self.cart.price_of(&primary).await?;
                self.cart.set_quantity(&primary, quantity).await?;
                self.stage = FlowStage::CartUpdated;

                self.cart
                    .verify_product_in_cart(&primary, price, quantity)
                    .await?;
                self.cart
                    .verify_total_price(price * u64::from(quantity))
                    .await?;
                self.expect_single_row(&primary).await
            }
            Scenario::RemoveOneProduct => {
                self.add_product(&primary, None).await?;
                let price = self.add_product(&secondary, None).await?;
                self.open_cart().await?;
                self.cart.remove_product(&primary).await?;
                self.stage = FlowStage::CartUpdated;

                self.cart.verify_product_in_cart(&secondary, price, 1).await?;
                self.cart.verify_total_price(price).await?;
                if self.cart.find_line_item(&primary).await?.is_some() {
                    return Err(HarnessError::assertion(format!(
                        "'{}' is still in the cart after removal",
                        primary
                    )));
                }
                Ok(())
            }
            Scenario::EmptyCart => {
                self.add_product(&primary, None).await?;
                self.open_cart().await?;
                self.cart.remove_all_products().await?;
                self.stage = FlowStage::CartUpdated;
                self.cart.verify_cart_is_empty().await
            }
            Scenario::PersistAfterRelogin => {
                self.add_product(&primary, None).await?;
                self.logout().await?;
                self.ensure_logged_in().await?;

                self.open_cart().await?;
                let price = self.cart.price_of(&primary).await?;
                self.cart.verify_product_in_cart(&primary, price, 1).await?;
                self.cart.verify_total_price(price).await
            }
            Scenario::ProceedToCheckout => {
                self.add_product(&primary, None).await?;
                self.open_cart().await?;

                self.cart.proceed_to_checkout().await?;
                self.stage = FlowStage::CheckedOut;

                let shipping = self.config.site.shipping_fragment.as_str();
                let browser = self.session.browser();
                match self
                    .session
                    .wait()
                    .until_url_contains(browser, shipping, None)
                    .await
                {
                    Ok(url) => {
                        info!("Reached shipping address page: {}", url);
                        Ok(())
                    }
                    Err(HarnessError::Timeout { .. }) => {
                        let url = browser.current_url().await?;
                        Err(HarnessError::assertion(format!(
                            "Expected to be redirected to the {} page, but current URL is: {}",
                            shipping, url
                        )))
                    }
                    Err(e) => Err(e),
                }
            }
            Scenario::DoubleAdd => {
                let price = self.add_product(&primary, None).await?;
                self.add_product(&primary, None).await?;
                self.open_cart().await?;
                self.cart.verify_product_in_cart(&primary, price, 2).await?;
                self.cart.verify_total_price(price * 2).await?;
                self.expect_single_row(&primary).await
            }
        }
    }

    async fn expect_single_row(&self, name: &str) -> Result<()> {
        let rows = self.cart.count_matching(name).await?;
        if rows != 1 {
            return Err(HarnessError::assertion(format!(
                "Expected one cart row for '{}', found {}",
                name, rows
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "flows_test.rs"]
mod flows_test;
