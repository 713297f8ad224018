//! Error types
//!
//! One enum per failure domain: route registration, request dispatch,
//! template rendering and server startup.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Failure raised by application code inside a handler or exception hook
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by every handler callable
pub type HandlerResult = Result<(), HandlerError>;

/// Route registration failures, surfaced to the code doing the registering
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route `{0}` is already registered")]
    Duplicate(String),

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Per-request dispatch failures
///
/// `MethodNotAllowed` and `Handler` are handed to the exception hook when one
/// is configured. `ExceptionHook` is what the hook itself returned and is
/// never retried.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("handler for {path} failed: {source}")]
    Handler {
        path: String,
        #[source]
        source: HandlerError,
    },

    #[error("exception hook failed: {source}")]
    ExceptionHook {
        #[source]
        source: HandlerError,
    },
}

impl DispatchError {
    pub const fn is_method_not_allowed(&self) -> bool {
        matches!(self, Self::MethodNotAllowed { .. })
    }
}

/// Template lookup and rendering failures
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid template name `{0}`")]
    InvalidName(String),

    #[error("failed to read template `{name}`: {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to render template `{name}`: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Server startup failures
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("host `{0}` did not resolve to any address")]
    NoAddress(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("No ports available to run the API (tried {host}:{first}..={last})")]
    PortsExhausted { host: String, first: u16, last: u16 },

    #[error(transparent)]
    Io(#[from] io::Error),
}
