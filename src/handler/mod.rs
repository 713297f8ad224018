//! Request handler module
//!
//! Handler values, the dispatcher that invokes them, and the static-file
//! collaborator that serves the reserved asset prefix.
//!
//! A route is served either by a single function or by a [`Resource`] holding
//! one function per HTTP method. The kind is fixed when the route is
//! registered, so dispatch never inspects the handler's shape.

pub mod dispatcher;
pub mod resource;
pub mod static_files;

use crate::error::{DispatchError, HandlerResult};
use crate::http::{Request, Response};
use crate::routing::Params;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub use dispatcher::Dispatcher;
pub use resource::Resource;
pub use static_files::{StaticFiles, StaticRouter};

/// A handler callable: reads the request, writes the response state
pub type HandlerFn = Arc<dyn Fn(&Request, &mut Response, &Params) -> HandlerResult + Send + Sync>;

/// Called with the failure when a dispatch step errors
pub type ExceptionHook =
    Arc<dyn Fn(&Request, &mut Response, &DispatchError) -> HandlerResult + Send + Sync>;

/// What a route dispatches to
#[derive(Clone)]
pub enum HandlerRef {
    /// One callable for every allowed method
    Function(HandlerFn),
    /// One callable per method; the route's allow-list is not consulted
    Resource(Arc<Resource>),
}

impl HandlerRef {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Request, &mut Response, &Params) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    pub fn resource(resource: Resource) -> Self {
        Self::Resource(Arc::new(resource))
    }

    /// The callable serving `method` (lower-cased), if this handler accepts it
    pub fn resolve(&self, method: &str, allowed: Option<&HashSet<String>>) -> Option<&HandlerFn> {
        match self {
            Self::Function(f) => match allowed {
                Some(methods) if !methods.contains(method) => None,
                _ => Some(f),
            },
            Self::Resource(resource) => resource.handler(method),
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function"),
            Self::Resource(resource) => f.debug_tuple("Resource").field(resource).finish(),
        }
    }
}
