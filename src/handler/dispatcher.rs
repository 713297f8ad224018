//! Request dispatch module
//!
//! Innermost stage of the pipeline: route lookup, method check, handler
//! invocation and exception routing.
//!
//! ```text
//! Received → Matching ─┬─ no route → 404 "Not found. :(" ─────────────┐
//!                      └─ matched → MethodCheck ─┬─ denied ──┐         │
//!                                                └─ Invoking ┤         │
//!                                                      ok ───┼─────────┤
//!                                                      failed ┘         ▼
//!                                      hook set? ── yes → hook ──→ Finalize
//!                                                └─ no  → Propagate
//! ```

use super::ExceptionHook;
use crate::error::DispatchError;
use crate::http::{Request, Response, WireResponse};
use crate::logger;
use crate::routing::{Params, RouteEntry, RouteTable};

pub struct Dispatcher {
    routes: RouteTable,
    exception_hook: Option<ExceptionHook>,
}

impl Dispatcher {
    pub const fn new(routes: RouteTable, exception_hook: Option<ExceptionHook>) -> Self {
        Self {
            routes,
            exception_hook,
        }
    }

    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Produce the finalized response for `request`
    ///
    /// Errors only when a dispatch step failed and no exception hook is
    /// configured, or when the hook itself failed.
    pub fn dispatch(&self, request: &Request) -> Result<WireResponse, DispatchError> {
        let mut response = Response::new();

        let Some((entry, params)) = self.routes.match_route(request.path()) else {
            logger::log_debug(&format!("No route for {}", request.path()));
            response.not_found();
            return Ok(response.finalize());
        };

        if let Err(error) = invoke(entry, request, &mut response, &params) {
            let Some(hook) = &self.exception_hook else {
                return Err(error);
            };
            logger::log_debug(&format!("Routing failure to exception hook: {error}"));
            hook(request, &mut response, &error)
                .map_err(|source| DispatchError::ExceptionHook { source })?;
        }

        Ok(response.finalize())
    }
}

fn invoke(
    entry: &RouteEntry,
    request: &Request,
    response: &mut Response,
    params: &Params,
) -> Result<(), DispatchError> {
    let method = request.method_lowercase();
    let handler = entry
        .handler()
        .resolve(&method, entry.allowed_methods())
        .ok_or_else(|| DispatchError::MethodNotAllowed {
            method: request.method().to_string(),
            path: request.path().to_string(),
        })?;

    handler(request, response, params).map_err(|source| DispatchError::Handler {
        path: request.path().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerResult;
    use crate::handler::{HandlerRef, Resource};
    use crate::http::NOT_FOUND_BODY;
    use std::sync::Arc;

    fn make_hook<F>(f: F) -> ExceptionHook
    where
        F: Fn(&Request, &mut Response, &DispatchError) -> HandlerResult + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    fn table() -> RouteTable {
        let mut routes = RouteTable::new();
        routes
            .register(
                "/home",
                HandlerRef::function(|_, resp, _| {
                    resp.set_text("Hello");
                    Ok(())
                }),
                Some(&["post"]),
            )
            .unwrap();
        routes
            .register(
                "/book",
                HandlerRef::resource(Resource::new().post(|_, resp, _| {
                    resp.set_text("Lumos!");
                    Ok(())
                })),
                Some(&["get", "post"]),
            )
            .unwrap();
        routes
            .register(
                "/sum/{num_1:d}/{num_2:d}",
                HandlerRef::function(|_, resp, params| {
                    let a = params.int("num_1").unwrap_or_default();
                    let b = params.int("num_2").unwrap_or_default();
                    resp.set_text(format!("{a} + {b} = {}", a + b));
                    Ok(())
                }),
                None,
            )
            .unwrap();
        routes
            .register(
                "/exception",
                HandlerRef::function(|_, _, _| Err("Sorry, this handler should not be used".into())),
                None,
            )
            .unwrap();
        routes
    }

    #[test]
    fn test_unmatched_path_is_404() {
        let dispatcher = Dispatcher::new(table(), None);
        let wire = dispatcher.dispatch(&Request::new("GET", "/doesnotexist")).unwrap();
        assert_eq!(wire.status, 404);
        assert_eq!(wire.text(), NOT_FOUND_BODY);
        assert_eq!(wire.content_type, "text/plain");
    }

    #[test]
    fn test_params_passed_to_handler() {
        let dispatcher = Dispatcher::new(table(), None);
        let wire = dispatcher.dispatch(&Request::new("GET", "/sum/12/13")).unwrap();
        assert_eq!(wire.text(), "12 + 13 = 25");
        let wire = dispatcher.dispatch(&Request::new("GET", "/sum/12/13/14")).unwrap();
        assert_eq!(wire.status, 404);
    }

    #[test]
    fn test_function_allow_list() {
        let dispatcher = Dispatcher::new(table(), None);
        let err = dispatcher.dispatch(&Request::new("GET", "/home")).unwrap_err();
        assert!(err.is_method_not_allowed());
        let wire = dispatcher.dispatch(&Request::new("POST", "/home")).unwrap();
        assert_eq!(wire.text(), "Hello");
    }

    #[test]
    fn test_resource_method_lookup() {
        let dispatcher = Dispatcher::new(table(), None);
        let err = dispatcher.dispatch(&Request::new("GET", "/book")).unwrap_err();
        assert!(matches!(err, DispatchError::MethodNotAllowed { ref method, .. } if method == "GET"));
        let wire = dispatcher.dispatch(&Request::new("post", "/book")).unwrap();
        assert_eq!(wire.text(), "Lumos!");
    }

    #[test]
    fn test_handler_error_propagates_without_hook() {
        let dispatcher = Dispatcher::new(table(), None);
        let err = dispatcher.dispatch(&Request::new("GET", "/exception")).unwrap_err();
        assert!(matches!(err, DispatchError::Handler { ref path, .. } if path == "/exception"));
        assert!(err.to_string().contains("should not be used"));
    }

    #[test]
    fn test_exception_hook_populates_response() {
        let hook = make_hook(|_, resp, error| {
            resp.set_status(500);
            resp.set_text(format!("caught: {}", error.is_method_not_allowed()));
            Ok(())
        });
        let dispatcher = Dispatcher::new(table(), Some(hook));

        let wire = dispatcher.dispatch(&Request::new("GET", "/exception")).unwrap();
        assert_eq!(wire.status, 500);
        assert_eq!(wire.text(), "caught: false");

        let wire = dispatcher.dispatch(&Request::new("GET", "/home")).unwrap();
        assert_eq!(wire.text(), "caught: true");
    }

    #[test]
    fn test_exception_hook_failure_propagates() {
        let hook = make_hook(|_, _, _| Err("hook broke".into()));
        let dispatcher = Dispatcher::new(table(), Some(hook));
        let err = dispatcher.dispatch(&Request::new("GET", "/exception")).unwrap_err();
        assert!(matches!(err, DispatchError::ExceptionHook { .. }));
    }

    #[test]
    fn test_hook_not_called_for_404() {
        let hook = make_hook(|_, resp, _| {
            resp.set_text("hooked");
            Ok(())
        });
        let dispatcher = Dispatcher::new(table(), Some(hook));
        let wire = dispatcher.dispatch(&Request::new("GET", "/nowhere")).unwrap();
        assert_eq!(wire.text(), NOT_FOUND_BODY);
    }
}
