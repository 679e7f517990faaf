use std::time::Duration;

use fantoccini::error::CmdError;

use crate::flows::FlowStage;

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Everything that can halt a flow, with the exit code the CLI reports for it
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A locator never resolved to an element (exit code 2)
    #[error("Not found: {0}")]
    NotFound(String),
    /// A wait condition never held (exit code 5)
    #[error("Timed out after {:.1}s waiting for {condition}", .timeout.as_secs_f64())]
    Timeout { condition: String, timeout: Duration },
    /// Normal click was swallowed by an overlay; recovered by forced click
    #[error("Click intercepted on {0}")]
    ClickIntercepted(String),
    /// Cart or page state did not match expectations (exit code 3)
    #[error("Assertion failed: {0}")]
    Assertion(String),
    /// WebDriver/session level failure (exit code 4)
    #[error("WebDriver failure: {0}")]
    WebDriver(String),
    /// Bad or missing configuration (exit code 6)
    #[error("Configuration error: {0}")]
    Config(String),
    /// Run was cancelled while a flow was in progress (exit code 130)
    #[error("Interrupted: {0}")]
    Interrupted(String),
    /// A scenario failed; wraps the underlying cause with where it happened
    #[error("{id} failed at stage '{stage}': {source}")]
    Scenario {
        id: String,
        stage: FlowStage,
        #[source]
        source: Box<HarnessError>,
    },
    /// Generic error (exit code 1)
    #[error(transparent)]
    Other(anyhow::Error),
}

impl HarnessError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            HarnessError::NotFound(_) => 2,
            HarnessError::Assertion(_) => 3,
            HarnessError::WebDriver(_) => 4,
            HarnessError::Timeout { .. } => 5,
            HarnessError::Config(_) => 6,
            HarnessError::Interrupted(_) => 130,
            HarnessError::Scenario { source, .. } => source.exit_code(),
            HarnessError::ClickIntercepted(_) | HarnessError::Other(_) => 1,
        }
    }

    /// Innermost error, skipping scenario wrappers
    pub fn root(&self) -> &HarnessError {
        match self {
            HarnessError::Scenario { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self.root(), HarnessError::Interrupted(_))
    }

    /// A DOM read raced a re-render; polling again may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            HarnessError::NotFound(_) => true,
            HarnessError::WebDriver(msg) => matches!(
                classify_message(msg),
                CommandFault::Stale | CommandFault::Missing
            ),
            _ => false,
        }
    }

    pub(crate) fn assertion(msg: impl Into<String>) -> Self {
        HarnessError::Assertion(msg.into())
    }
}

/// What a WebDriver command failure means for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFault {
    /// No element matched
    Missing,
    /// The element reference points at a node that left the DOM
    Stale,
    /// Another element would receive the click
    ClickIntercepted,
    /// Anything else
    Fatal,
}

/// Classify a WebDriver error message into a [`CommandFault`]
///
/// Drivers differ in wording, so this matches on the W3C error codes and the
/// phrases chromedriver and geckodriver put in their messages.
pub fn classify_message(msg: &str) -> CommandFault {
    let msg = msg.to_lowercase();
    if msg.contains("stale element") || msg.contains("is no longer attached") {
        CommandFault::Stale
    } else if msg.contains("no such element") || msg.contains("unable to locate element") {
        CommandFault::Missing
    } else if msg.contains("click intercepted")
        || msg.contains("not clickable at point")
        || msg.contains("obscures it")
        || msg.contains("not interactable")
    {
        CommandFault::ClickIntercepted
    } else {
        CommandFault::Fatal
    }
}

pub(crate) fn classify(err: &CmdError) -> CommandFault {
    classify_message(&err.to_string())
}

impl From<CmdError> for HarnessError {
    fn from(err: CmdError) -> Self {
        HarnessError::WebDriver(err.to_string())
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        HarnessError::Other(err.into())
    }
}

impl From<anyhow::Error> for HarnessError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<HarnessError>() {
            Ok(harness) => return harness,
            Err(err) => err,
        };

        // Try to detect specific error types from the error message
        let msg = err.to_string();
        if msg.contains("Failed to connect to WebDriver")
            || msg.contains("geckodriver")
            || msg.contains("chromedriver")
        {
            HarnessError::WebDriver(msg)
        } else {
            HarnessError::Other(err)
        }
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
