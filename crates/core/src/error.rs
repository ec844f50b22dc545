//! The `Category: description` error-shape contract (spec section 7).
//!
//! Processors and step executors return errors in this shape; the pool
//! and the store never invent one, only propagate and, where needed,
//! prefix a category onto an error that arrived without one.

use serde::{Deserialize, Serialize};

/// The taxonomy of job-visible error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ErrorCategory {
    Validation,
    Network,
    /// An HTTP response with a non-2xx status. Carries the status code so
    /// `Display` renders `HTTP 404`, `HTTP 503`, ...
    Http(u16),
    Timeout,
    Scraping,
    Storage,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "Validation"),
            Self::Network => write!(f, "Network"),
            Self::Http(code) => write!(f, "HTTP {code}"),
            Self::Timeout => write!(f, "Timeout"),
            Self::Scraping => write!(f, "Scraping"),
            Self::Storage => write!(f, "Storage"),
            Self::System => write!(f, "System"),
        }
    }
}

/// Maximum length of an error message shown to a UI caller (spec section
/// 7: "Long errors are truncated to 200 characters before display but
/// stored in full").
pub const ERROR_DISPLAY_TRUNCATE_LEN: usize = 200;

/// Build the canonical `Category: description` error string.
pub fn format_job_error(category: ErrorCategory, description: &str) -> String {
    format!("{category}: {description}")
}

/// Prefix a category onto an error string that does not already start
/// with a recognized `Category:` prefix. Idempotent: a message that
/// already carries a category is returned unchanged.
pub fn ensure_categorized(category: ErrorCategory, message: &str) -> String {
    if has_known_category_prefix(message) {
        message.to_string()
    } else {
        format_job_error(category, message)
    }
}

fn has_known_category_prefix(message: &str) -> bool {
    const KNOWN: &[&str] = &[
        "Validation:",
        "Network:",
        "Timeout:",
        "Scraping:",
        "Storage:",
        "System:",
    ];
    if KNOWN.iter().any(|p| message.starts_with(p)) {
        return true;
    }
    // "HTTP <code>: ..." — only the digits vary.
    message
        .strip_prefix("HTTP ")
        .and_then(|rest| rest.split_once(':'))
        .map(|(code, _)| code.chars().all(|c| c.is_ascii_digit()) && !code.is_empty())
        .unwrap_or(false)
}

/// Truncate a message to [`ERROR_DISPLAY_TRUNCATE_LEN`] characters for UI
/// display. The caller is responsible for persisting the full string
/// separately; this function never mutates stored data.
pub fn truncate_for_display(message: &str) -> String {
    if message.chars().count() <= ERROR_DISPLAY_TRUNCATE_LEN {
        message.to_string()
    } else {
        let truncated: String = message.chars().take(ERROR_DISPLAY_TRUNCATE_LEN).collect();
        truncated
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
