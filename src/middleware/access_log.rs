//! Access log middleware
//!
//! Writes one line per handled request. Requests whose dispatch failed never
//! reach `after_response`, so they appear in the error log instead.

use super::Middleware;
use crate::config::LoggingConfig;
use crate::http::{Request, WireResponse};
use crate::logger::{self, AccessLogEntry};

#[derive(Debug, Clone)]
pub struct AccessLog {
    format: String,
}

impl AccessLog {
    /// `format` is `combined`, `common`, `json` or a `$variable` pattern
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(config.access_log_format.clone())
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// The line this stage writes for one exchange
    pub fn line(&self, req: &Request, resp: &WireResponse) -> String {
        AccessLogEntry::from_exchange(req, resp).format(&self.format)
    }
}

impl Middleware for AccessLog {
    fn after_response(&self, req: &Request, resp: &mut WireResponse) {
        logger::log_access(&AccessLogEntry::from_exchange(req, resp), &self.format);
    }
}
