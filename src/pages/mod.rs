//! Page objects for the storefront
//!
//! Each page object borrows the run's [`Session`](crate::session::Session) and
//! exposes the user-level operations a flow needs. Operations wait for the
//! element they act on, act, and where the page gives a signal, wait for the
//! post-condition before returning.

mod cart;
mod home;
mod login;
mod product;

pub use cart::{CartState, ShoppingCartPage};
pub use home::HomePage;
pub use login::LoginPage;
pub use product::ProductDetailPage;
