// Mock bookstore shared between the integration tests and the mock-shop binary
//
// Mirrors the storefront markup the default locator registry targets. State is
// a single shopper: one login flag and one cart, reset through POST /__reset.

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

pub const SHOP_EMAIL: &str = "buyer@example.com";
pub const SHOP_PASSWORD: &str = "correct-horse";

pub struct MockProduct {
    pub id: &'static str,
    pub slug: &'static str,
    pub name: &'static str,
    pub price: u64,
    /// Card-holder price rendered as "<price> or <alt> with Periplus card"
    pub alt_price: Option<u64>,
    /// Whether the cart's remove link actually removes it
    pub removable: bool,
}

pub const CATALOG: &[MockProduct] = &[
    MockProduct {
        id: "9781847941831",
        slug: "atomic-habits",
        name: "Atomic Habits",
        price: 108_000,
        alt_price: None,
        removable: true,
    },
    MockProduct {
        id: "9781546171461",
        slug: "sunrise-on-the-reaping",
        name: "Sunrise on the Reaping",
        price: 350_000,
        alt_price: Some(315_000),
        removable: true,
    },
    MockProduct {
        id: "9780593189641",
        slug: "the-creative-act",
        name: "The Creative Act",
        price: 1_234_567,
        alt_price: None,
        removable: true,
    },
    MockProduct {
        id: "9781250237231",
        slug: "permanent-record",
        name: "Permanent Record",
        price: 185_000,
        alt_price: None,
        removable: false,
    },
];

#[derive(Clone, Default)]
pub struct ShopState {
    inner: Arc<Mutex<ShopData>>,
}

#[derive(Default, Serialize, Clone, Debug)]
pub struct ShopData {
    pub logged_in: bool,
    pub cart: Vec<CartEntry>,
}

#[derive(Serialize, Clone, Debug)]
pub struct CartEntry {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct SearchQuery {
    filter_name: Option<String>,
}

#[derive(Deserialize)]
struct AddForm {
    product_id: String,
    quantity: Option<String>,
}

#[derive(Deserialize)]
struct UpdateQuery {
    id: String,
    quantity: String,
}

#[derive(Deserialize)]
struct RemoveQuery {
    id: String,
}

pub async fn create_app() -> Router {
    let state = ShopState::default();

    Router::new()
        .route("/", get(home_page))
        .route("/account/Login", get(login_page).post(handle_login))
        .route("/account/Your-Account", get(account_page))
        .route("/_index_/Logout", get(handle_logout))
        .route("/product/Search", get(search_page))
        .route("/p/:id/:slug", get(product_page))
        .route("/checkout/cart", get(cart_page))
        .route("/checkout/cart/add", post(add_to_cart))
        .route("/checkout/cart/update", get(update_cart))
        .route("/checkout/cart/remove", get(remove_from_cart))
        .route("/checkout/shipping_address", get(shipping_page))
        .route("/__reset", post(reset))
        .route("/__state", get(shop_state))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn find_product(id: &str) -> Option<&'static MockProduct> {
    CATALOG.iter().find(|p| p.id == id)
}

fn rupiah(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("Rp {}", grouped)
}

fn price_label(product: &MockProduct) -> String {
    match product.alt_price {
        Some(alt) => format!(
            "{} or {} with Periplus card",
            rupiah(product.price),
            rupiah(alt)
        ),
        None => rupiah(product.price),
    }
}

fn remove_href(product: &MockProduct) -> String {
    if product.removable {
        format!("/checkout/cart/remove?id={}", product.id)
    } else {
        "javascript:void(0)".to_string()
    }
}

fn layout(title: &str, logged_in: bool, body: &str) -> Html<String> {
    let account = if logged_in {
        r#"<div class="account-menu" style="display:none">
                <a href="/account/Your-Account">My Account</a>
                <a href="/_index_/Logout">Logout</a>
            </div>"#
    } else {
        r#"<a href="/account/Login">Sign In</a>"#
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{title} | Periplus.com</title></head>
<body>
    <header>
        <form action="/product/Search" method="get">
            <input type="text" name="filter_name" value="" placeholder="Search">
            <button type="submit" class="btn btnn">Search</button>
        </form>
        {account}
    </header>
    <main>
        {body}
    </main>
</body>
</html>"#
    ))
}

async fn home_page(State(state): State<ShopState>) -> Html<String> {
    let data = state.inner.lock().await;
    layout(
        "Online Bookstore",
        data.logged_in,
        "<h1>Welcome to Periplus</h1>",
    )
}

fn login_form(error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<div class="alert alert-danger">{}</div>"#, e))
        .unwrap_or_default();
    format!(
        r#"<h1>Login</h1>
        {error}
        <form method="post" action="/account/Login">
            <input type="text" name="email">
            <input type="password" name="password">
            <input type="submit" class="button" value="Login">
        </form>"#
    )
}

async fn login_page(State(state): State<ShopState>) -> Html<String> {
    let data = state.inner.lock().await;
    layout("Login", data.logged_in, &login_form(None))
}

async fn handle_login(State(state): State<ShopState>, Form(form): Form<LoginForm>) -> Response {
    let mut data = state.inner.lock().await;
    if form.email == SHOP_EMAIL && form.password == SHOP_PASSWORD {
        data.logged_in = true;
        Redirect::to("/account/Your-Account").into_response()
    } else {
        layout(
            "Login",
            false,
            &login_form(Some("Warning: No match for E-Mail Address and/or Password.")),
        )
        .into_response()
    }
}

async fn account_page(State(state): State<ShopState>) -> Response {
    let data = state.inner.lock().await;
    if !data.logged_in {
        return Redirect::to("/account/Login").into_response();
    }
    layout("My Account", true, "<h1>My Account</h1>").into_response()
}

async fn handle_logout(State(state): State<ShopState>) -> Redirect {
    state.inner.lock().await.logged_in = false;
    Redirect::to("/")
}

async fn search_page(
    State(state): State<ShopState>,
    Query(query): Query<SearchQuery>,
) -> Html<String> {
    let term = query.filter_name.unwrap_or_default().to_lowercase();
    let links: Vec<String> = CATALOG
        .iter()
        .filter(|p| !term.is_empty() && p.name.to_lowercase().contains(&term))
        .map(|p| {
            format!(
                r#"<div class="col-6 col-md-3 single-product">
                    <h3><a href="/p/{}/{}">{}</a></h3>
                    <div class="product-price">{}</div>
                </div>"#,
                p.id,
                p.slug,
                p.name,
                rupiah(p.price)
            )
        })
        .collect();

    let body = if links.is_empty() {
        "<p>There is no product that matches the search criteria.</p>".to_string()
    } else {
        links.join("\n")
    };

    let data = state.inner.lock().await;
    layout(
        "Search",
        data.logged_in,
        &format!(r#"<div class="row row-category-grid">{}</div>"#, body),
    )
}

async fn product_page(
    State(state): State<ShopState>,
    Path((id, _slug)): Path<(String, String)>,
) -> Response {
    let Some(product) = find_product(&id) else {
        return Redirect::to("/").into_response();
    };
    let data = state.inner.lock().await;

    let body = format!(
        r#"<h2>{name}</h2>
        <div class="quickview-price">{price}</div>
        <div class="quantity">
            <input type="text" class="form-control input-number textareaa-product" name="quantity" value="1">
        </div>
        <button type="button" class="btn btn-add-to-cart" onclick="cartAdd()">Add to Cart</button>
        <div class="loading-overlay" style="display:none">Loading...</div>
        <script>
            var qty = document.querySelector('.textareaa-product');
            qty.addEventListener('keydown', function (e) {{
                if (e.key === 'Enter') {{ e.preventDefault(); }}
            }});
            function cartAdd() {{
                var overlay = document.querySelector('.loading-overlay');
                overlay.style.display = 'block';
                fetch('/checkout/cart/add', {{
                    method: 'POST',
                    headers: {{ 'Content-Type': 'application/x-www-form-urlencoded' }},
                    body: 'product_id={id}&quantity=' + encodeURIComponent(qty.value)
                }}).then(function () {{
                    setTimeout(function () {{ overlay.style.display = 'none'; }}, 150);
                }});
            }}
        </script>"#,
        name = product.name,
        price = price_label(product),
        id = product.id,
    );
    layout(product.name, data.logged_in, &body).into_response()
}

async fn add_to_cart(
    State(state): State<ShopState>,
    Form(form): Form<AddForm>,
) -> Json<serde_json::Value> {
    let quantity = form
        .quantity
        .and_then(|q| q.trim().parse::<u32>().ok())
        .filter(|q| *q > 0)
        .unwrap_or(1);

    if find_product(&form.product_id).is_none() {
        return Json(serde_json::json!({ "success": false }));
    }

    let mut data = state.inner.lock().await;
    match data
        .cart
        .iter_mut()
        .find(|line| line.product_id == form.product_id)
    {
        Some(line) => line.quantity += quantity,
        None => data.cart.push(CartEntry {
            product_id: form.product_id,
            quantity,
        }),
    }
    Json(serde_json::json!({ "success": true }))
}

async fn cart_page(State(state): State<ShopState>) -> Html<String> {
    let data = state.inner.lock().await;

    if data.cart.is_empty() {
        return layout(
            "Shopping Cart",
            data.logged_in,
            r#"<h1>Shopping Cart</h1>
            <div class="content">Your shopping cart is empty</div>"#,
        );
    }

    let mut rows = String::new();
    let mut total = 0;
    for line in &data.cart {
        let Some(product) = find_product(&line.product_id) else {
            continue;
        };
        total += product.price * u64::from(line.quantity);
        rows.push_str(&format!(
            r#"<div class="row row-cart-product">
                <div class="col-lg-2 col-3"><span class="cover"></span></div>
                <div class="col-lg-10 col-9">
                    <p class="product-name limit-lines">{name}</p>
                    <div class="row">{price}</div>
                    <div class="quantity">
                        <input type="text" class="form-control input-number" data-id="{id}" value="{qty}">
                    </div>
                    <a class="btn btn-cart-remove" href="{remove}">Remove</a>
                </div>
            </div>"#,
            name = product.name,
            price = price_label(product),
            id = product.id,
            qty = line.quantity,
            remove = remove_href(product),
        ));
    }

    let body = format!(
        r#"<h1>Shopping Cart</h1>
        {rows}
        <div class="cart-summary">Sub-Total: <span id="sub_total">{total}</span></div>
        <div class="button5"><a href="javascript:void(0)" onclick="beginCheckout(); return false;">Checkout</a></div>
        <script>
            document.querySelectorAll('.row-cart-product input.input-number').forEach(function (input) {{
                input.addEventListener('keydown', function (e) {{
                    if (e.key === 'Enter') {{
                        e.preventDefault();
                        window.location.href = '/checkout/cart/update?id=' + input.dataset.id
                            + '&quantity=' + encodeURIComponent(input.value);
                    }}
                }});
            }});
            function beginCheckout() {{
                window.location.href = '/checkout/shipping_address';
            }}
        </script>"#,
        rows = rows,
        total = rupiah(total),
    );
    layout("Shopping Cart", data.logged_in, &body)
}

async fn update_cart(State(state): State<ShopState>, Query(query): Query<UpdateQuery>) -> Redirect {
    let mut data = state.inner.lock().await;
    match query.quantity.trim().parse::<u32>() {
        Ok(0) => data.cart.retain(|line| line.product_id != query.id),
        Ok(quantity) => {
            if let Some(line) = data.cart.iter_mut().find(|line| line.product_id == query.id) {
                line.quantity = quantity;
            }
        }
        Err(_) => {}
    }
    Redirect::to("/checkout/cart")
}

async fn remove_from_cart(
    State(state): State<ShopState>,
    Query(query): Query<RemoveQuery>,
) -> Redirect {
    state
        .inner
        .lock()
        .await
        .cart
        .retain(|line| line.product_id != query.id);
    Redirect::to("/checkout/cart")
}

async fn shipping_page(State(state): State<ShopState>) -> Response {
    let data = state.inner.lock().await;
    if !data.logged_in {
        return Redirect::to("/account/Login").into_response();
    }
    layout(
        "Shipping Address",
        true,
        "<h1>Shipping Address</h1><form><input type=\"text\" name=\"address\"></form>",
    )
    .into_response()
}

async fn reset(State(state): State<ShopState>) -> Json<serde_json::Value> {
    let mut data = state.inner.lock().await;
    *data = ShopData::default();
    Json(serde_json::json!({ "success": true }))
}

async fn shop_state(State(state): State<ShopState>) -> Json<ShopData> {
    Json(state.inner.lock().await.clone())
}
