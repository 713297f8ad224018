//! Middleware module
//!
//! Middleware stages wrap the dispatcher in onion order. Stages are collected
//! in the order they are added and folded once into a nested chain when the
//! application is built; the chain never changes while serving.
//!
//! With stage A added before stage B a request runs:
//!
//! ```text
//! B.before_request → A.before_request → dispatch → A.after_response → B.after_response
//! ```
//!
//! A dispatch error unwinds straight out of the chain: no `after_response`
//! hook runs for that request.

mod access_log;

pub use access_log::AccessLog;

use crate::error::DispatchError;
use crate::handler::Dispatcher;
use crate::http::{Request, WireResponse};

/// A cross-cutting stage; both hooks default to no-ops
pub trait Middleware: Send + Sync {
    fn before_request(&self, _req: &Request) {}
    fn after_response(&self, _req: &Request, _resp: &mut WireResponse) {}
}

/// Anything that turns a request into a finalized response
pub trait Handle: Send + Sync {
    fn handle(&self, request: &Request) -> Result<WireResponse, DispatchError>;
}

impl Handle for Dispatcher {
    fn handle(&self, request: &Request) -> Result<WireResponse, DispatchError> {
        self.dispatch(request)
    }
}

/// One middleware wrapped around its inner target
struct Stage {
    middleware: Box<dyn Middleware>,
    inner: Box<dyn Handle>,
}

impl Handle for Stage {
    fn handle(&self, request: &Request) -> Result<WireResponse, DispatchError> {
        self.middleware.before_request(request);
        let mut response = self.inner.handle(request)?;
        self.middleware.after_response(request, &mut response);
        Ok(response)
    }
}

/// The assembled, immutable middleware chain
pub struct Pipeline {
    head: Box<dyn Handle>,
}

impl Pipeline {
    /// Wrap `dispatcher` in `stages`, each later stage around all earlier ones
    pub fn assemble(dispatcher: Dispatcher, stages: Vec<Box<dyn Middleware>>) -> Self {
        let head = stages
            .into_iter()
            .fold(Box::new(dispatcher) as Box<dyn Handle>, |inner, middleware| {
                Box::new(Stage { middleware, inner }) as Box<dyn Handle>
            });
        Self { head }
    }
}

impl Handle for Pipeline {
    fn handle(&self, request: &Request) -> Result<WireResponse, DispatchError> {
        self.head.handle(request)
    }
}
