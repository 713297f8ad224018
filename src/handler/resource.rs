//! Resource handlers
//!
//! A resource groups the callables for one path by HTTP method, the way a
//! class with `get` and `post` methods would.

use super::HandlerFn;
use crate::error::HandlerResult;
use crate::http::{Request, Response};
use crate::routing::Params;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Resource {
    methods: BTreeMap<String, HandlerFn>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a callable for `method`; a later call for the same method replaces it
    #[must_use]
    pub fn on<F>(mut self, method: &str, f: F) -> Self
    where
        F: Fn(&Request, &mut Response, &Params) -> HandlerResult + Send + Sync + 'static,
    {
        self.methods.insert(method.to_ascii_lowercase(), Arc::new(f));
        self
    }

    #[must_use]
    pub fn get<F>(self, f: F) -> Self
    where
        F: Fn(&Request, &mut Response, &Params) -> HandlerResult + Send + Sync + 'static,
    {
        self.on("get", f)
    }

    #[must_use]
    pub fn post<F>(self, f: F) -> Self
    where
        F: Fn(&Request, &mut Response, &Params) -> HandlerResult + Send + Sync + 'static,
    {
        self.on("post", f)
    }

    /// Callable for a method name, matched case-insensitively
    pub fn handler(&self, method: &str) -> Option<&HandlerFn> {
        self.methods.get(&method.to_ascii_lowercase())
    }

    /// Supported methods, lower-cased and sorted
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.methods.keys()).finish()
    }
}
