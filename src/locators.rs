//! Locator registry: where each semantic element lives on each page
//!
//! Every element the page objects touch is addressed by `(Page, Role)`. A role
//! resolves to an ordered fallback chain of selectors; the first selector that
//! matches anything in the live DOM wins. Site redesigns are handled by
//! overriding chains from configuration instead of forking page objects.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use fantoccini::Locator;
use serde::{Deserialize, Serialize};

use crate::errors::{HarnessError, Result};

/// Logical page of the storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Home,
    Login,
    ProductDetail,
    ShoppingCart,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Login => "login",
            Page::ProductDetail => "product_detail",
            Page::ShoppingCart => "shopping_cart",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "home" => Ok(Page::Home),
            "login" => Ok(Page::Login),
            "product_detail" => Ok(Page::ProductDetail),
            "shopping_cart" => Ok(Page::ShoppingCart),
            _ => Err(HarnessError::Config(format!("Unknown page: {}", s))),
        }
    }
}

/// Semantic role of an element within a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SearchBox,
    SearchButton,
    ProductGrid,
    ProductLink,
    LogoutLink,
    EmailField,
    PasswordField,
    LoginButton,
    AddToCartButton,
    QuantityInput,
    ProductPrice,
    LoadingOverlay,
    /// One rendered cart line; the `Row*` roles are scoped to it
    CartRow,
    RowName,
    RowPrice,
    RowQuantity,
    RowRemove,
    /// Any remove control on the cart page, unscoped
    RemoveButton,
    Subtotal,
    CheckoutButton,
    EmptyCartMessage,
}

const ALL_ROLES: &[Role] = &[
    Role::SearchBox,
    Role::SearchButton,
    Role::ProductGrid,
    Role::ProductLink,
    Role::LogoutLink,
    Role::EmailField,
    Role::PasswordField,
    Role::LoginButton,
    Role::AddToCartButton,
    Role::QuantityInput,
    Role::ProductPrice,
    Role::LoadingOverlay,
    Role::CartRow,
    Role::RowName,
    Role::RowPrice,
    Role::RowQuantity,
    Role::RowRemove,
    Role::RemoveButton,
    Role::Subtotal,
    Role::CheckoutButton,
    Role::EmptyCartMessage,
];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SearchBox => "search_box",
            Role::SearchButton => "search_button",
            Role::ProductGrid => "product_grid",
            Role::ProductLink => "product_link",
            Role::LogoutLink => "logout_link",
            Role::EmailField => "email_field",
            Role::PasswordField => "password_field",
            Role::LoginButton => "login_button",
            Role::AddToCartButton => "add_to_cart_button",
            Role::QuantityInput => "quantity_input",
            Role::ProductPrice => "product_price",
            Role::LoadingOverlay => "loading_overlay",
            Role::CartRow => "cart_row",
            Role::RowName => "row_name",
            Role::RowPrice => "row_price",
            Role::RowQuantity => "row_quantity",
            Role::RowRemove => "row_remove",
            Role::RemoveButton => "remove_button",
            Role::Subtotal => "subtotal",
            Role::CheckoutButton => "checkout_button",
            Role::EmptyCartMessage => "empty_cart_message",
        }
    }

    /// Human-readable name used in log lines and failures
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Role {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        ALL_ROLES
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| HarnessError::Config(format!("Unknown element role: {}", s)))
    }
}

/// One way of finding an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selector {
    Css(String),
    #[serde(rename = "xpath")]
    XPath(String),
}

impl Selector {
    pub fn css(value: impl Into<String>) -> Self {
        Selector::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Selector::XPath(value.into())
    }

    pub fn value(&self) -> &str {
        match self {
            Selector::Css(v) | Selector::XPath(v) => v,
        }
    }

    /// Borrow as a fantoccini locator
    pub fn as_locator(&self) -> Locator<'_> {
        match self {
            Selector::Css(v) => Locator::Css(v),
            Selector::XPath(v) => Locator::XPath(v),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(v) => write!(f, "css={}", v),
            Selector::XPath(v) => write!(f, "xpath={}", v),
        }
    }
}

/// A semantic element on a page and the selectors that can find it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementLocator {
    page: Page,
    role: Role,
    chain: Vec<Selector>,
}

impl ElementLocator {
    pub fn new(page: Page, role: Role, chain: Vec<Selector>) -> Result<Self> {
        if chain.is_empty() {
            return Err(HarnessError::Config(format!(
                "Locator {}.{} needs at least one selector",
                page, role.as_str()
            )));
        }
        Ok(ElementLocator { page, role, chain })
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Selectors in the order they are tried
    pub fn selectors(&self) -> &[Selector] {
        &self.chain
    }

    /// e.g. "search box on the home page"
    pub fn describe(&self) -> String {
        format!("{} on the {} page", self.role, self.page.as_str().replace('_', " "))
    }
}

impl fmt::Display for ElementLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.page, self.role.as_str())
    }
}

/// Immutable `(page, role) → locator` table
#[derive(Debug, Clone)]
pub struct LocatorRegistry {
    entries: HashMap<(Page, Role), ElementLocator>,
}

impl LocatorRegistry {
    /// Selectors for the current periplus.com markup
    pub fn periplus() -> Self {
        let mut entries = HashMap::new();
        let mut add = |page: Page, role: Role, chain: Vec<Selector>| {
            entries.insert((page, role), ElementLocator { page, role, chain });
        };

        // Home
        add(
            Page::Home,
            Role::SearchBox,
            vec![Selector::xpath("//input[@name='filter_name']")],
        );
        add(
            Page::Home,
            Role::SearchButton,
            vec![Selector::xpath(
                "//button[@type='submit' and contains(@class,'btnn')]",
            )],
        );
        add(
            Page::Home,
            Role::ProductGrid,
            vec![Selector::xpath("//div[@class='row row-category-grid']")],
        );
        add(
            Page::Home,
            Role::LogoutLink,
            vec![
                Selector::xpath("//a[contains(@href,'Logout')]"),
                Selector::xpath("//a[contains(text(),'Logout') or contains(text(),'Log Out')]"),
            ],
        );

        // Login
        add(
            Page::Login,
            Role::EmailField,
            vec![Selector::xpath("//input[@name='email']")],
        );
        add(
            Page::Login,
            Role::PasswordField,
            vec![Selector::xpath("//input[@name='password']")],
        );
        add(
            Page::Login,
            Role::LoginButton,
            vec![Selector::xpath(
                "//input[@type='submit' and contains(@value,'Login')]",
            )],
        );

        // Product detail
        add(
            Page::ProductDetail,
            Role::ProductLink,
            vec![Selector::xpath(
                "//div[@class='row row-category-grid']//a[contains(@href,'/p/')]",
            )],
        );
        add(
            Page::ProductDetail,
            Role::AddToCartButton,
            vec![
                Selector::xpath(
                    "//button[contains(text(),'Add to Cart') or contains(text(),'Add To Cart') or contains(@class,'btn-add-to-cart')]",
                ),
                Selector::xpath("//button[contains(@onclick,'cart.add')]"),
            ],
        );
        add(
            Page::ProductDetail,
            Role::QuantityInput,
            vec![Selector::xpath(
                "//input[contains(@class,'input-number') and contains(@class,'textareaa-product') and @type='text']",
            )],
        );
        add(
            Page::ProductDetail,
            Role::ProductPrice,
            vec![Selector::xpath("//div[@class='quickview-price']")],
        );
        add(
            Page::ProductDetail,
            Role::LoadingOverlay,
            vec![Selector::css(".loading-overlay")],
        );

        // Shopping cart
        add(
            Page::ShoppingCart,
            Role::CartRow,
            vec![Selector::xpath("//div[@class='row row-cart-product']")],
        );
        add(
            Page::ShoppingCart,
            Role::RowName,
            vec![Selector::xpath(".//p[contains(@class,'product-name')]")],
        );
        add(
            Page::ShoppingCart,
            Role::RowPrice,
            vec![Selector::xpath(
                ".//div[contains(@class,'col-lg-10') and contains(@class,'col-9')]//div[@class='row' and contains(.,'Rp ')]",
            )],
        );
        add(
            Page::ShoppingCart,
            Role::RowQuantity,
            vec![Selector::xpath(
                ".//input[contains(@class,'input-number') and @type='text']",
            )],
        );
        add(
            Page::ShoppingCart,
            Role::RowRemove,
            vec![Selector::xpath(".//a[contains(@class,'btn btn-cart-remove')]")],
        );
        add(
            Page::ShoppingCart,
            Role::RemoveButton,
            vec![Selector::xpath("//a[contains(@class,'btn btn-cart-remove')]")],
        );
        add(
            Page::ShoppingCart,
            Role::Subtotal,
            vec![Selector::xpath("//span[@id='sub_total']")],
        );
        add(
            Page::ShoppingCart,
            Role::CheckoutButton,
            vec![Selector::xpath(
                "//div[@class='button5']//a[contains(@onclick,'beginCheckout()')]",
            )],
        );
        add(
            Page::ShoppingCart,
            Role::EmptyCartMessage,
            vec![Selector::xpath(
                "//div[@class='content' and text()='Your shopping cart is empty']",
            )],
        );

        LocatorRegistry { entries }
    }

    /// Replace fallback chains with `"<page>.<role>" → selectors` overrides
    ///
    /// Only roles already registered may be overridden.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, Vec<Selector>>) -> Result<Self> {
        for (key, chain) in overrides {
            let (page, role) = key.split_once('.').ok_or_else(|| {
                HarnessError::Config(format!(
                    "Locator override key '{}' must look like <page>.<role>",
                    key
                ))
            })?;
            let page: Page = page.parse()?;
            let role: Role = role.parse()?;

            if !self.entries.contains_key(&(page, role)) {
                return Err(HarnessError::Config(format!(
                    "No element '{}' is registered for the {} page",
                    role.as_str(),
                    page
                )));
            }

            let locator = ElementLocator::new(page, role, chain.clone())?;
            self.entries.insert((page, role), locator);
        }
        Ok(self)
    }

    pub fn get(&self, page: Page, role: Role) -> Result<&ElementLocator> {
        self.entries.get(&(page, role)).ok_or_else(|| {
            HarnessError::NotFound(format!(
                "no locator registered for {} on the {} page",
                role, page
            ))
        })
    }

    /// Roles registered for a page, in a stable order
    pub fn roles(&self, page: Page) -> Vec<Role> {
        ALL_ROLES
            .iter()
            .copied()
            .filter(|role| self.entries.contains_key(&(page, *role)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LocatorRegistry {
    fn default() -> Self {
        Self::periplus()
    }
}

#[cfg(test)]
#[path = "locators_test.rs"]
mod locators_test;
