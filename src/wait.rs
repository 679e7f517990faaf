//! Bounded polling for UI conditions
//!
//! The storefront renders asynchronously, so every read or click is preceded
//! by a wait for the element to be in the right state. Waits poll at a fixed
//! interval and give up after a timeout: a locator that never matched anything
//! fails with `NotFound`, a condition that never held fails with `Timeout`.

use std::future::Future;
use std::time::Duration;

use fantoccini::elements::Element;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::browser::Browser;
use crate::errors::{CommandFault, HarnessError, Result, classify};
use crate::locators::ElementLocator;

/// Default timeout for wait operations
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default poll interval for checking conditions
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One evaluation of a wait condition
#[derive(Debug)]
pub enum Probe<T> {
    /// Condition holds
    Ready(T),
    /// Something matched but the condition does not hold yet
    Pending,
    /// Nothing matched the locator at all
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Used when a call does not override it
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        WaitPolicy {
            timeout,
            poll_interval,
        }
    }

    /// Poll `probe` until it reports ready or the timeout elapses
    ///
    /// Errors returned by `probe` abort the wait immediately.
    pub async fn poll<T, F, Fut>(
        &self,
        condition: &str,
        timeout: Option<Duration>,
        probe: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Probe<T>>>,
    {
        self.poll_inner(condition, timeout, None, probe).await
    }

    async fn poll_inner<T, F, Fut>(
        &self,
        condition: &str,
        timeout: Option<Duration>,
        locator: Option<&ElementLocator>,
        mut probe: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Probe<T>>>,
    {
        let timeout = timeout.unwrap_or(self.timeout);
        let deadline = Instant::now() + timeout;
        let mut matched_any = false;

        loop {
            match probe().await? {
                Probe::Ready(value) => return Ok(value),
                Probe::Pending => matched_any = true,
                Probe::Absent => {}
            }

            let now = Instant::now();
            if now >= deadline {
                debug!("Gave up waiting for {} after {:?}", condition, timeout);
                return Err(match locator {
                    Some(locator) if !matched_any => HarnessError::NotFound(format!(
                        "{} never appeared (waited {:.1}s for it to be {})",
                        locator.describe(),
                        timeout.as_secs_f64(),
                        condition
                    )),
                    _ => HarnessError::Timeout {
                        condition: condition.to_string(),
                        timeout,
                    },
                });
            }

            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// First displayed element matching `locator`
    pub async fn until_visible(
        &self,
        browser: &Browser,
        locator: &ElementLocator,
        timeout: Option<Duration>,
    ) -> Result<Element> {
        let condition = format!("{} to be visible", locator.describe());
        self.poll_inner(&condition, timeout, Some(locator), || async move {
            let elements = browser.find_all(locator).await?;
            if elements.is_empty() {
                return Ok(Probe::Absent);
            }
            for element in elements {
                if displayed(&element).await? {
                    return Ok(Probe::Ready(element));
                }
            }
            Ok(Probe::Pending)
        })
        .await
    }

    /// First element matching `locator`, displayed or not
    pub async fn until_present(
        &self,
        browser: &Browser,
        locator: &ElementLocator,
        timeout: Option<Duration>,
    ) -> Result<Element> {
        let condition = format!("{} to be present", locator.describe());
        self.poll_inner(&condition, timeout, Some(locator), || async move {
            match browser.find_all(locator).await?.into_iter().next() {
                Some(element) => Ok(Probe::Ready(element)),
                None => Ok(Probe::Absent),
            }
        })
        .await
    }

    /// First displayed and enabled element matching `locator`
    pub async fn until_clickable(
        &self,
        browser: &Browser,
        locator: &ElementLocator,
        timeout: Option<Duration>,
    ) -> Result<Element> {
        let condition = format!("{} to be clickable", locator.describe());
        self.poll_inner(&condition, timeout, Some(locator), || async move {
            let elements = browser.find_all(locator).await?;
            if elements.is_empty() {
                return Ok(Probe::Absent);
            }
            for element in elements {
                if displayed(&element).await? && enabled(&element).await? {
                    return Ok(Probe::Ready(element));
                }
            }
            Ok(Probe::Pending)
        })
        .await
    }

    /// Same as [`until_clickable`](Self::until_clickable) for an element already in hand
    pub async fn until_element_clickable(
        &self,
        element: &Element,
        label: &str,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let condition = format!("{} to be clickable", label);
        self.poll(&condition, timeout, || async move {
            if displayed(element).await? && enabled(element).await? {
                Ok(Probe::Ready(()))
            } else {
                Ok(Probe::Pending)
            }
        })
        .await
    }

    /// All elements matching `locator`, once at least one exists and all are displayed
    pub async fn until_all_visible(
        &self,
        browser: &Browser,
        locator: &ElementLocator,
        timeout: Option<Duration>,
    ) -> Result<Vec<Element>> {
        let condition = format!("every {} to be visible", locator.describe());
        self.poll_inner(&condition, timeout, Some(locator), || async move {
            let elements = browser.find_all(locator).await?;
            if elements.is_empty() {
                return Ok(Probe::Absent);
            }
            for element in &elements {
                if !displayed(element).await? {
                    return Ok(Probe::Pending);
                }
            }
            Ok(Probe::Ready(elements))
        })
        .await
    }

    /// Passes once nothing matching `locator` is displayed (absence counts)
    pub async fn until_invisible(
        &self,
        browser: &Browser,
        locator: &ElementLocator,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let condition = format!("{} to disappear", locator.describe());
        self.poll(&condition, timeout, || async move {
            for element in browser.find_all(locator).await? {
                if displayed(&element).await? {
                    return Ok(Probe::Pending);
                }
            }
            Ok(Probe::Ready(()))
        })
        .await
    }

    /// Passes once `element` has been detached from the DOM
    pub async fn until_stale(
        &self,
        element: &Element,
        label: &str,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let condition = format!("{} to be replaced", label);
        self.poll(&condition, timeout, || async move {
            if is_stale(element).await? {
                Ok(Probe::Ready(()))
            } else {
                Ok(Probe::Pending)
            }
        })
        .await
    }

    pub async fn until_url_contains(
        &self,
        browser: &Browser,
        fragment: &str,
        timeout: Option<Duration>,
    ) -> Result<String> {
        self.until_url_matches(
            browser,
            &format!("URL to contain '{}'", fragment),
            |url| url.contains(fragment),
            timeout,
        )
        .await
    }

    pub async fn until_url_contains_any(
        &self,
        browser: &Browser,
        fragments: &[&str],
        timeout: Option<Duration>,
    ) -> Result<String> {
        self.until_url_matches(
            browser,
            &format!("URL to contain any of {:?}", fragments),
            |url| fragments.iter().any(|f| url.contains(f)),
            timeout,
        )
        .await
    }

    /// Current URL, once `predicate` accepts it
    pub async fn until_url_matches<P>(
        &self,
        browser: &Browser,
        description: &str,
        predicate: P,
        timeout: Option<Duration>,
    ) -> Result<String>
    where
        P: Fn(&str) -> bool,
    {
        let predicate = &predicate;
        self.poll(description, timeout, || async move {
            let url = browser.current_url().await?;
            if predicate(&url) {
                Ok(Probe::Ready(url))
            } else {
                Ok(Probe::Pending)
            }
        })
        .await
    }

    pub async fn until_title_contains(
        &self,
        browser: &Browser,
        fragment: &str,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let condition = format!("page title to contain '{}'", fragment);
        self.poll(&condition, timeout, || async move {
            let title = browser.title().await?;
            if title.contains(fragment) {
                Ok(Probe::Ready(title))
            } else {
                Ok(Probe::Pending)
            }
        })
        .await
    }

    /// Passes once `document.readyState` reports `complete`
    pub async fn until_document_ready(
        &self,
        browser: &Browser,
        timeout: Option<Duration>,
    ) -> Result<()> {
        self.poll("document to finish loading", timeout, || async move {
            match browser
                .execute("return document.readyState === 'complete';", vec![])
                .await
            {
                Ok(val) if val.as_bool().unwrap_or(false) => Ok(Probe::Ready(())),
                _ => Ok(Probe::Pending),
            }
        })
        .await
    }
}

/// `is_displayed`, treating a node that vanished mid-check as not displayed
pub(crate) async fn displayed(element: &Element) -> Result<bool> {
    match element.is_displayed().await {
        Ok(shown) => Ok(shown),
        Err(e) => match classify(&e) {
            CommandFault::Stale | CommandFault::Missing => Ok(false),
            _ => Err(e.into()),
        },
    }
}

/// Whether `element` has left the DOM
pub(crate) async fn is_stale(element: &Element) -> Result<bool> {
    match element.is_enabled().await {
        Ok(_) => Ok(false),
        Err(e) => match classify(&e) {
            CommandFault::Stale | CommandFault::Missing => Ok(true),
            _ => Err(e.into()),
        },
    }
}

async fn enabled(element: &Element) -> Result<bool> {
    match element.is_enabled().await {
        Ok(on) => Ok(on),
        Err(e) => match classify(&e) {
            CommandFault::Stale | CommandFault::Missing => Ok(false),
            _ => Err(e.into()),
        },
    }
}

#[cfg(test)]
#[path = "wait_test.rs"]
mod wait_test;
