use fantoccini::elements::Element;
use tracing::{debug, info, warn};

use crate::errors::{HarnessError, Result};
use crate::locators::{Page, Role};
use crate::money::{Currency, strip_alternative};
use crate::session::Session;
use crate::types::{CartLineItem, MatchStrategy};
use crate::wait::{Probe, displayed, is_stale};

/// What the cart page showed once it settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    /// Number of visible product rows
    Filled(usize),
    Empty,
}

/// A cart row as read from the DOM, with its price text as rendered
#[derive(Debug)]
struct RowReading {
    item: CartLineItem,
    price_text: String,
}

impl RowReading {
    /// Interpret one row's raw texts; any card-holder alternative price is dropped
    fn parse(name: String, raw_price: &str, raw_quantity: &str, currency: &Currency) -> Result<Self> {
        let price_text = strip_alternative(raw_price).to_string();
        let unit_price = currency.parse(&price_text)?;
        let quantity = raw_quantity.trim().parse::<u32>().map_err(|_| {
            HarnessError::assertion(format!(
                "Quantity '{}' for '{}' is not a whole number",
                raw_quantity, name
            ))
        })?;
        Ok(RowReading {
            item: CartLineItem {
                name,
                unit_price,
                quantity,
            },
            price_text,
        })
    }

    /// Rendered price must equal `expected_price` exactly, then the quantity must match
    fn verify(&self, name: &str, expected_price: &str, expected_quantity: u32) -> Result<()> {
        if self.price_text != expected_price {
            return Err(HarnessError::assertion(format!(
                "Price for product '{}' is incorrect. Expected: {}, Actual: {}",
                name, expected_price, self.price_text
            )));
        }
        if self.item.quantity != expected_quantity {
            return Err(HarnessError::assertion(format!(
                "Quantity for product '{}' is incorrect. Expected: {}, Actual: {}",
                name, expected_quantity, self.item.quantity
            )));
        }
        Ok(())
    }
}

/// Index of the first name matching `wanted`
fn first_match<'n, I>(names: I, wanted: &str, strategy: MatchStrategy) -> Option<usize>
where
    I: IntoIterator<Item = &'n str>,
{
    names
        .into_iter()
        .position(|actual| strategy.matches(actual, wanted))
}

/// Subtotal text must show `expected` under `strategy`
fn verify_total(rendered: &str, expected: &str, strategy: MatchStrategy) -> Result<()> {
    if strategy.matches(rendered, expected) {
        Ok(())
    } else {
        Err(HarnessError::assertion(format!(
            "Cart total is incorrect. Expected: {}, Actual: {}",
            expected, rendered
        )))
    }
}

pub struct ShoppingCartPage<'a> {
    session: &'a Session,
}

impl<'a> ShoppingCartPage<'a> {
    pub fn new(session: &'a Session) -> Self {
        ShoppingCartPage { session }
    }

    /// Load the cart and wait until it shows either rows or the empty message
    pub async fn navigate(&self) -> Result<CartState> {
        let url = self.session.site().cart_url()?;
        self.session.open(&url).await?;
        let state = self.wait_for_contents().await?;
        info!("Navigated to shopping cart ({:?})", state);
        Ok(state)
    }

    async fn wait_for_contents(&self) -> Result<CartState> {
        let browser = self.session.browser();
        let rows = self.session.locator(Page::ShoppingCart, Role::CartRow)?;
        let empty = self
            .session
            .locator(Page::ShoppingCart, Role::EmptyCartMessage)?;

        self.session
            .wait()
            .poll(
                "cart rows or the empty-cart message to be visible",
                None,
                || async move {
                    let mut shown = 0;
                    for row in browser.find_all(rows).await? {
                        if displayed(&row).await? {
                            shown += 1;
                        }
                    }
                    if shown > 0 {
                        return Ok(Probe::Ready(CartState::Filled(shown)));
                    }
                    for message in browser.find_all(empty).await? {
                        if displayed(&message).await? {
                            return Ok(Probe::Ready(CartState::Empty));
                        }
                    }
                    Ok(Probe::Pending)
                },
            )
            .await
    }

    async fn read_row(&self, row: &Element) -> Result<RowReading> {
        let browser = self.session.browser();
        let name = self.read_name(row).await?;

        let price_locator = self.session.locator(Page::ShoppingCart, Role::RowPrice)?;
        let price_el = browser.find_within(row, price_locator).await?;
        let raw_price = browser.text_of(&price_el).await?;

        let qty_locator = self.session.locator(Page::ShoppingCart, Role::RowQuantity)?;
        let qty_el = browser.find_within(row, qty_locator).await?;
        let raw_qty = browser.value_of(&qty_el).await?;

        RowReading::parse(name, &raw_price, &raw_qty, &self.session.rules().currency)
    }

    async fn read_name(&self, row: &Element) -> Result<String> {
        let browser = self.session.browser();
        let locator = self.session.locator(Page::ShoppingCart, Role::RowName)?;
        let element = browser.find_within(row, locator).await?;
        browser.text_of(&element).await
    }

    /// First current row whose name matches `name`
    async fn row_for(&self, name: &str) -> Result<Option<Element>> {
        let rows = self
            .session
            .find_all(Page::ShoppingCart, Role::CartRow)
            .await?;
        let mut names = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let actual = self.read_name(row).await?;
            debug!("Cart item {} product name: {}", i + 1, actual);
            names.push(actual);
        }

        let strategy = self.session.rules().name_match;
        Ok(first_match(names.iter().map(String::as_str), name, strategy)
            .and_then(|index| rows.into_iter().nth(index)))
    }

    async fn require_row(&self, name: &str) -> Result<Element> {
        self.row_for(name)
            .await?
            .ok_or_else(|| HarnessError::NotFound(format!("product '{}' in the cart", name)))
    }

    /// Every product currently in the cart, read fresh from the page
    pub async fn line_items(&self) -> Result<Vec<CartLineItem>> {
        let rows = self
            .session
            .find_all(Page::ShoppingCart, Role::CartRow)
            .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(self.read_row(row).await?.item);
        }
        Ok(items)
    }

    pub async fn find_line_item(&self, name: &str) -> Result<Option<CartLineItem>> {
        match self.row_for(name).await? {
            Some(row) => Ok(Some(self.read_row(&row).await?.item)),
            None => Ok(None),
        }
    }

    /// Rows whose name matches `name`
    pub async fn count_matching(&self, name: &str) -> Result<usize> {
        let strategy = self.session.rules().name_match;
        let mut count = 0;
        for item in self.line_items().await? {
            if strategy.matches(&item.name, name) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Unit price of the product named `name`
    pub async fn price_of(&self, name: &str) -> Result<u64> {
        self.wait_for_contents().await?;
        let row = self.require_row(name).await?;
        let reading = self.read_row(&row).await?;
        info!(
            "Actual price text found: '{}' for product '{}'",
            reading.price_text, reading.item.name
        );
        Ok(reading.item.unit_price)
    }

    /// Change a row's quantity and wait for the cart to show it
    ///
    /// The cart has applied the change once the old input has been replaced or
    /// the subtotal has moved, and the re-located row reads `quantity`.
    pub async fn set_quantity(&self, name: &str, quantity: u32) -> Result<()> {
        let browser = self.session.browser();
        let row = self.require_row(name).await?;
        let current = self.read_row(&row).await?.item.quantity;
        if current == quantity {
            info!("'{}' already has quantity {}", name, quantity);
            return Ok(());
        }
        info!("Product '{}' found. Setting quantity to {}", name, quantity);

        let before = self.subtotal_text().await?;
        let locator = self.session.locator(Page::ShoppingCart, Role::RowQuantity)?;
        let input = browser.find_within(&row, locator).await?;
        browser.set_value(&input, &quantity.to_string()).await?;
        browser.press_enter(&input).await?;

        let input = &input;
        let before = before.as_str();
        self.session
            .wait()
            .poll(
                &format!("'{}' to show quantity {}", name, quantity),
                None,
                || async move {
                    let applied = is_stale(input).await?
                        || self.subtotal_text().await.is_ok_and(|now| now != before);
                    if !applied {
                        return Ok(Probe::Pending);
                    }
                    match self.find_line_item(name).await {
                        Ok(Some(item)) if item.quantity == quantity => Ok(Probe::Ready(())),
                        Ok(_) => Ok(Probe::Pending),
                        Err(e) if e.is_transient() => Ok(Probe::Pending),
                        Err(e) => Err(e),
                    }
                },
            )
            .await?;
        info!("Quantity of '{}' is now {}", name, quantity);
        Ok(())
    }

    /// Subtotal as currently rendered, empty when not on the page
    async fn subtotal_text(&self) -> Result<String> {
        let browser = self.session.browser();
        match self
            .session
            .find_all(Page::ShoppingCart, Role::Subtotal)
            .await?
            .first()
        {
            Some(element) => browser.text_of(element).await,
            None => Ok(String::new()),
        }
    }

    /// Remove the product named `name`
    pub async fn remove_product(&self, name: &str) -> Result<()> {
        let browser = self.session.browser();
        let row = self.require_row(name).await?;
        info!("Product '{}' found. Removing it", name);

        let locator = self.session.locator(Page::ShoppingCart, Role::RowRemove)?;
        let button = browser.find_within(&row, locator).await?;
        self.remove_via(&button).await?;
        info!("'{}' removed from cart", name);
        Ok(())
    }

    /// Click a remove control and wait for the cart to re-render without it
    async fn remove_via(&self, button: &Element) -> Result<()> {
        let browser = self.session.browser();
        let wait = self.session.wait();
        let label = Role::RowRemove.label();

        wait.until_element_clickable(button, &label, None).await?;
        browser.click(button, &label).await?;
        wait.until_stale(button, &label, None).await?;
        self.wait_for_contents().await?;
        Ok(())
    }

    /// Empty the cart, one remove control at a time
    ///
    /// A failed removal is logged and the sweep continues. Gives up with an
    /// assertion failure once `removal_attempt_limit` clicks have not emptied it.
    pub async fn remove_all_products(&self) -> Result<()> {
        if self.navigate().await? == CartState::Empty {
            info!("Cart is already empty");
            return Ok(());
        }

        let limit = self.session.rules().removal_attempt_limit;
        let mut attempts = 0;
        loop {
            let buttons = self
                .session
                .find_all(Page::ShoppingCart, Role::RemoveButton)
                .await?;
            let Some(button) = buttons.into_iter().next() else {
                break;
            };

            if attempts >= limit {
                return Err(HarnessError::assertion(format!(
                    "Cart still has items after {} removal attempts",
                    limit
                )));
            }
            attempts += 1;

            match self.remove_via(&button).await {
                Ok(()) => info!("Item removed ({} removal attempts so far)", attempts),
                Err(e) => warn!(
                    "Error during product removal: {}. Attempting next item if any",
                    e
                ),
            }
        }

        info!("All products removed from cart");
        Ok(())
    }

    /// Assert a row for `name` exists with the expected price and quantity
    pub async fn verify_product_in_cart(
        &self,
        name: &str,
        expected_price: u64,
        expected_quantity: u32,
    ) -> Result<()> {
        if let CartState::Empty = self.wait_for_contents().await? {
            return Err(HarnessError::assertion(format!(
                "Cart is empty, expected '{}'",
                name
            )));
        }

        let row = self.row_for(name).await?.ok_or_else(|| {
            HarnessError::assertion(format!("Product '{}' not found in cart", name))
        })?;
        let reading = self.read_row(&row).await?;
        info!("Product '{}' found in cart", reading.item.name);

        let expected_text = self.session.rules().currency.format(expected_price);
        reading.verify(name, &expected_text, expected_quantity)?;
        info!(
            "Price and quantity for '{}' verified: {} x {}",
            name, reading.price_text, reading.item.quantity
        );
        Ok(())
    }

    /// Assert the subtotal shows `expected_total`
    pub async fn verify_total_price(&self, expected_total: u64) -> Result<()> {
        let rules = self.session.rules();
        let element = self
            .session
            .visible(Page::ShoppingCart, Role::Subtotal, None)
            .await?;
        let actual = self.session.browser().text_of(&element).await?;
        let expected = rules.currency.format(expected_total);
        info!("Found total price in cart: {}", actual);

        verify_total(&actual, &expected, rules.total_match)
    }

    /// Assert the empty-cart message is shown with the expected wording
    pub async fn verify_cart_is_empty(&self) -> Result<()> {
        info!("Verifying the shopping cart is empty");
        let expected = self.session.rules().empty_cart_message.as_str();

        let element = match self
            .session
            .visible(Page::ShoppingCart, Role::EmptyCartMessage, None)
            .await
        {
            Ok(element) => element,
            Err(e @ (HarnessError::NotFound(_) | HarnessError::Timeout { .. })) => {
                return Err(HarnessError::assertion(format!(
                    "'{}' message was not shown: {}",
                    expected, e
                )));
            }
            Err(e) => return Err(e),
        };

        let actual = self.session.browser().text_of(&element).await?;
        if actual != expected {
            return Err(HarnessError::assertion(format!(
                "Empty cart message is not as expected. Expected: '{}', Actual: '{}'",
                expected, actual
            )));
        }
        info!("Verified '{}' is displayed", actual);
        Ok(())
    }

    /// Click checkout and wait to leave the cart for the checkout flow
    pub async fn proceed_to_checkout(&self) -> Result<String> {
        info!("Attempting to proceed to checkout");
        self.session
            .click(Page::ShoppingCart, Role::CheckoutButton)
            .await?;

        let site = self.session.site();
        let fragment = site.checkout_fragment.as_str();
        let cart_path = site.cart_path.as_str();
        let url = self
            .session
            .wait()
            .until_url_matches(
                self.session.browser(),
                &format!("URL to contain '{}' and leave the cart", fragment),
                |url| url.contains(fragment) && !url.contains(cart_path),
                None,
            )
            .await?;
        info!("Proceeded to checkout: {}", url);
        Ok(url)
    }
}

#[cfg(test)]
#[path = "cart_test.rs"]
mod cart_test;
