//! Crawler error taxonomy
//!
//! Errors are grouped by how far they are allowed to travel: a browser
//! launch failure ends a source's run, navigation and selector failures end
//! a page, everything else degrades a single post.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CrawlerError {
    #[error("Browser launch failed: {message}")]
    BrowserLaunch { message: String },

    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("Timed out after {timeout_ms}ms: {operation}")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Page content unavailable: {message}")]
    PageContent { message: String },

    #[error("HTTP request failed: {status} - {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Repository error: {message}")]
    Repository { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String, field: String },

    #[error("Export/import failed: {message}")]
    Export {
        message: String,
        path: Option<String>,
    },
}

impl CrawlerError {
    pub fn browser_launch(message: impl Into<String>) -> Self {
        Self::BrowserLaunch {
            message: message.into(),
        }
    }

    pub fn navigation(url: &str, reason: impl Into<String>) -> Self {
        Self::NavigationFailed {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    pub fn page_content(message: impl Into<String>) -> Self {
        Self::PageContent {
            message: message.into(),
        }
    }

    pub fn configuration(field: &str, message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.to_string(),
        }
    }

    pub fn export(message: impl Into<String>, path: Option<&std::path::Path>) -> Self {
        Self::Export {
            message: message.into(),
            path: path.map(|p| p.display().to_string()),
        }
    }

    /// Check if another attempt could succeed
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::NavigationFailed { .. } | Self::Timeout { .. } | Self::PageContent { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::BrowserLaunch { .. }
            | Self::InvalidSelector { .. }
            | Self::UnknownSource(_)
            | Self::Repository { .. }
            | Self::Configuration { .. }
            | Self::Export { .. } => false,
        }
    }

    /// Extra wait suggested before retrying, on top of the policy backoff
    pub const fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::HttpStatus { status: 429, .. } => Some(10_000),
            Self::HttpStatus { status, .. } if *status >= 500 => Some(5_000),
            _ => None,
        }
    }
}

pub type CrawlerResult<T> = Result<T, CrawlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_errors_are_recoverable_but_launch_is_not() {
        assert!(CrawlerError::navigation("https://a", "reset").is_recoverable());
        assert!(CrawlerError::timeout("goto", 30_000).is_recoverable());
        assert!(!CrawlerError::browser_launch("no chrome").is_recoverable());
    }

    #[test]
    fn server_errors_suggest_a_retry_delay() {
        let err = CrawlerError::HttpStatus {
            status: 503,
            url: "https://a".into(),
        };
        assert_eq!(err.retry_delay_ms(), Some(5_000));
        let not_found = CrawlerError::HttpStatus {
            status: 404,
            url: "https://a".into(),
        };
        assert!(!not_found.is_recoverable());
        assert_eq!(not_found.retry_delay_ms(), None);
    }
}
