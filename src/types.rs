use serde::{Deserialize, Serialize};

use crate::errors::{HarnessError, Result};

/// Output format for CLI results
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// How rendered text is compared with an expected value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Rendered text contains the expected value (tolerates extra decoration)
    #[default]
    Contains,
    /// Rendered text, trimmed, equals the expected value
    Exact,
}

impl MatchStrategy {
    pub fn matches(&self, rendered: &str, expected: &str) -> bool {
        match self {
            MatchStrategy::Contains => rendered.contains(expected),
            MatchStrategy::Exact => rendered.trim() == expected.trim(),
        }
    }
}

/// One product as currently rendered in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Product name as displayed
    pub name: String,
    /// Unit price in whole currency units
    pub unit_price: u64,
    /// Quantity shown in the row's input
    pub quantity: u32,
}

impl CartLineItem {
    pub fn line_total(&self) -> u64 {
        self.unit_price * u64::from(self.quantity)
    }
}

/// Browser viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl ViewportSize {
    /// Parse viewport size from "WIDTHxHEIGHT" format (e.g., "1920x1080")
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            return Err(HarnessError::Config(
                "Invalid viewport format. Use WIDTHxHEIGHT (e.g., 1920x1080)".to_string(),
            ));
        }

        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| HarnessError::Config("Invalid width in viewport size".to_string()))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| HarnessError::Config("Invalid height in viewport size".to_string()))?;

        Ok(ViewportSize { width, height })
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
