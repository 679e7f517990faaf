//! Currency rendering and parsing for displayed prices

use serde::{Deserialize, Serialize};

use crate::errors::{HarnessError, Result};

/// How the storefront renders money: `"<prefix> <grouped integer>"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Currency {
    pub prefix: String,
    pub separator: char,
}

impl Default for Currency {
    fn default() -> Self {
        Currency {
            prefix: "Rp".to_string(),
            separator: ',',
        }
    }
}

impl Currency {
    /// `1234567` → `"Rp 1,234,567"`
    pub fn format(&self, amount: u64) -> String {
        let digits = amount.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(self.separator);
            }
            grouped.push(ch);
        }
        format!("{} {}", self.prefix, grouped)
    }

    /// Parse a displayed price back into whole currency units
    ///
    /// Accepts `"Rp 108,000"` and `"Rp 108,000 or Rp 97,200 with card"`.
    pub fn parse(&self, text: &str) -> Result<u64> {
        let primary = strip_alternative(text);
        let number = primary
            .strip_prefix(self.prefix.as_str())
            .ok_or_else(|| {
                HarnessError::assertion(format!(
                    "Price '{}' does not start with currency prefix '{}'",
                    text, self.prefix
                ))
            })?
            .trim();

        let cleaned: String = number
            .chars()
            .filter(|c| *c != self.separator && !c.is_whitespace())
            .collect();

        if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
            return Err(HarnessError::assertion(format!(
                "Price '{}' is not a whole {} amount",
                text, self.prefix
            )));
        }

        cleaned.parse::<u64>().map_err(|e| {
            HarnessError::assertion(format!("Price '{}' is out of range: {}", text, e))
        })
    }
}

/// Drop an `" or <alternative price>"` suffix and surrounding whitespace
pub fn strip_alternative(text: &str) -> &str {
    text.split(" or ").next().unwrap_or(text).trim()
}

/// Format with the storefront's default currency
pub fn format_currency(amount: u64) -> String {
    Currency::default().format(amount)
}
