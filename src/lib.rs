//! # cartprobe
#![allow(clippy::uninlined_format_args)]
//!
//! Browser-driven end-to-end checks for an online bookstore's shopping cart,
//! written as page objects over WebDriver.
//!
//! The default target is the Periplus storefront. Every selector, path and
//! product title can be overridden from configuration, which is how the
//! integration tests point the harness at a local mock shop.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Credentials for the test account
//! export CARTPROBE_EMAIL=buyer@example.com
//! export CARTPROBE_PASSWORD=...
//!
//! # Run every scenario (headless Chrome, chromedriver started if needed)
//! cartprobe run
//!
//! # Run a few scenarios with a visible Firefox window
//! cartprobe run --scenario cart-001 --scenario cart-004 --browser firefox --no-headless
//!
//! # Point at another deployment and print a one-line-per-scenario report
//! cartprobe run --base-url http://localhost:3000 --format simple
//!
//! # List scenarios, render a price, check for a running WebDriver
//! cartprobe list
//! cartprobe price 1234567      # Rp 1,234,567
//! cartprobe driver-status
//! ```
//!
//! Logs go to stderr (`RUST_LOG=cartprobe=debug` for more); the report goes to stdout.
//!
//! ## Exit Codes
//!
//! | code | meaning |
//! |------|---------|
//! | 0 | every scenario passed |
//! | 1 | other error |
//! | 2 | element not found |
//! | 3 | assertion failed |
//! | 4 | WebDriver failure |
//! | 5 | timeout |
//! | 6 | configuration error |
//! | 130 | interrupted |
//!
//! ## Library Usage
//!
//! ```no_run
//! use cartprobe::{HarnessConfig, Scenario, Session, SuiteRunner};
//!
//! # async fn example() -> cartprobe::Result<()> {
//! let mut config = HarnessConfig::load(None)?;
//! config.site.base_url = "http://127.0.0.1:3000".to_string();
//! config.validate()?;
//! let session = Session::start(&config).await?;
//!
//! let report = SuiteRunner::new(&session, &config)
//!     .run(&[Scenario::NavigateHome, Scenario::SingleProduct])
//!     .await;
//! session.close().await?;
//! assert!(report.success());
//! # Ok(())
//! # }
//! ```

/// WebDriver session and element actions
pub mod browser;

/// Layered harness configuration
pub mod config;

/// Automatic WebDriver process management
pub mod driver_manager;

pub mod errors;

/// Scenarios and the flow state they track
pub mod flows;

pub mod locators;

pub mod money;

/// Page objects for the storefront
pub mod pages;

pub mod session;

/// Sequential scenario runner and reports
pub mod suite;

pub mod types;

pub mod wait;

pub use browser::{Browser, BrowserKind};
pub use config::{Credentials, HarnessConfig};
pub use errors::{HarnessError, Result};
pub use flows::{FlowStage, Scenario, Storefront};
pub use locators::{LocatorRegistry, Page, Role, Selector};
pub use money::format_currency;
pub use session::Session;
pub use suite::{Interrupt, InterruptTrigger, ScenarioOutcome, SuiteReport, SuiteRunner};
pub use types::{CartLineItem, MatchStrategy, OutputFormat, ViewportSize};
pub use wait::WaitPolicy;
