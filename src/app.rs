//! Application assembly
//!
//! [`App`] collects routes, middleware and the exception hook during setup.
//! [`App::build`] freezes them into a [`Service`]: the static-path router in
//! front of the middleware pipeline, which wraps the dispatcher.

use crate::config::Config;
use crate::error::{DispatchError, HandlerResult, RouteError, TemplateError};
use crate::handler::{Dispatcher, ExceptionHook, HandlerRef, Resource, StaticFiles, StaticRouter};
use crate::http::{Request, Response, WireResponse};
use crate::logger;
use crate::middleware::{AccessLog, Handle, Middleware, Pipeline};
use crate::routing::{Params, RouteTable};
use crate::templates::Templates;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_STATIC_PREFIX: &str = "/static";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_TEMPLATES_DIR: &str = "templates";
const DEFAULT_SERVER_NAME: &str = "Lumos/0.1";

pub struct App {
    routes: RouteTable,
    middleware: Vec<Box<dyn Middleware>>,
    exception_hook: Option<ExceptionHook>,
    static_prefix: String,
    static_dir: PathBuf,
    templates: Arc<Templates>,
    server_name: String,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            routes: RouteTable::new(),
            middleware: Vec::new(),
            exception_hook: None,
            static_prefix: DEFAULT_STATIC_PREFIX.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            templates: Arc::new(Templates::new(DEFAULT_TEMPLATES_DIR)),
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }

    /// An app wired from configuration
    ///
    /// Adds the [`AccessLog`] stage when `logging.access_log` is on.
    pub fn from_config(config: &Config) -> Self {
        let mut app = Self::new();
        app.set_static(&config.static_files.prefix, &config.static_files.dir)
            .set_templates_dir(&config.templates.dir);
        app.server_name.clone_from(&config.http.server_name);
        if config.logging.access_log {
            app.add_middleware(AccessLog::from_config(&config.logging));
        }
        app
    }

    /// Route `pattern` to `f` for every HTTP method
    pub fn route<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response, &Params) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(pattern, HandlerRef::function(f), None)
    }

    /// Route `pattern` to `f` for the listed methods only
    pub fn route_with_methods<F>(
        &mut self,
        pattern: &str,
        methods: &[&str],
        f: F,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&Request, &mut Response, &Params) -> HandlerResult + Send + Sync + 'static,
    {
        self.add_route(pattern, HandlerRef::function(f), Some(methods))
    }

    /// Route `pattern` to a per-method resource
    pub fn resource(&mut self, pattern: &str, resource: Resource) -> Result<&mut Self, RouteError> {
        self.add_route(pattern, HandlerRef::resource(resource), None)
    }

    /// Register any handler; fails on a duplicate or malformed pattern
    pub fn add_route(
        &mut self,
        pattern: &str,
        handler: HandlerRef,
        allowed_methods: Option<&[&str]>,
    ) -> Result<&mut Self, RouteError> {
        self.routes.register(pattern, handler, allowed_methods)?;
        logger::log_route_registered(pattern);
        Ok(self)
    }

    /// Add a stage around everything added before it
    pub fn add_middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Set the hook that receives dispatch failures, replacing any earlier one
    pub fn add_exception_handler<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Request, &mut Response, &DispatchError) -> HandlerResult + Send + Sync + 'static,
    {
        if self.exception_hook.replace(Arc::new(f)).is_some() {
            logger::log_hook_replaced();
        }
        self
    }

    pub fn set_static(&mut self, prefix: &str, dir: impl Into<PathBuf>) -> &mut Self {
        self.static_prefix = prefix.to_string();
        self.static_dir = dir.into();
        self
    }

    pub fn set_templates_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.templates = Arc::new(Templates::new(dir));
        self
    }

    /// Shared handle for rendering inside handlers
    pub fn templates(&self) -> Arc<Templates> {
        Arc::clone(&self.templates)
    }

    pub fn template<S: Serialize>(&self, name: &str, context: S) -> Result<String, TemplateError> {
        self.templates.render(name, context)
    }

    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Freeze the app into a servable [`Service`]
    pub fn build(self) -> Service {
        let dispatcher = Dispatcher::new(self.routes, self.exception_hook);
        Service {
            static_router: StaticRouter::new(&self.static_prefix, StaticFiles::new(self.static_dir)),
            pipeline: Pipeline::assemble(dispatcher, self.middleware),
            server_name: self.server_name,
        }
    }

    /// In-process client over the built service
    pub fn test_client(self) -> TestClient {
        TestClient {
            service: Arc::new(self.build()),
        }
    }
}

/// The immutable request path: static assets first, then the pipeline
pub struct Service {
    static_router: StaticRouter,
    pipeline: Pipeline,
    server_name: String,
}

impl Service {
    pub async fn handle(&self, request: &Request) -> Result<WireResponse, DispatchError> {
        if let Some(stripped) = self.static_router.strip(request.path()) {
            return Ok(self.static_router.serve(stripped).await);
        }
        self.pipeline.handle(request)
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub const fn static_router(&self) -> &StaticRouter {
        &self.static_router
    }
}

/// Sends requests straight into a [`Service`] without a socket
#[derive(Clone)]
pub struct TestClient {
    service: Arc<Service>,
}

impl TestClient {
    pub async fn get(&self, target: &str) -> Result<WireResponse, DispatchError> {
        self.request("GET", target).await
    }

    pub async fn post(&self, target: &str) -> Result<WireResponse, DispatchError> {
        self.request("POST", target).await
    }

    pub async fn request(&self, method: &str, target: &str) -> Result<WireResponse, DispatchError> {
        self.send(Request::new(method, target)).await
    }

    pub async fn send(&self, request: Request) -> Result<WireResponse, DispatchError> {
        self.service.handle(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::NOT_FOUND_BODY;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    static FIXTURE_ID: AtomicUsize = AtomicUsize::new(0);

    fn fixture_dir(kind: &str) -> PathBuf {
        let id = FIXTURE_ID.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("lumos-app-{kind}-{}-{id}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn templates_dir() -> PathBuf {
        let dir = fixture_dir("templates");
        std::fs::write(
            dir.join("index.html"),
            "<html><head><title>{{ title }}</title></head><body><h1>{{ name }}</h1></body></html>",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_basic_route_adding() {
        let mut app = App::new();
        app.route_with_methods("/home", &["get", "post"], |_, resp, _| {
            resp.set_text("Lumos is on!");
            Ok(())
        })
        .unwrap();
        let err = app
            .route_with_methods("/home", &["get", "post"], |_, resp, _| {
                resp.set_text("Lumos is off!");
                Ok(())
            })
            .err()
            .unwrap();
        assert!(matches!(err, RouteError::Duplicate(ref p) if p == "/home"));
        assert_eq!(app.routes().len(), 1);
    }

    #[tokio::test]
    async fn test_client_can_send_requests() {
        let mut app = App::new();
        app.route("/lumos", |_, resp, _| {
            resp.set_text("Yes it can :)!");
            Ok(())
        })
        .unwrap();
        let client = app.test_client();
        assert_eq!(client.get("/lumos").await.unwrap().text(), "Yes it can :)!");
    }

    #[tokio::test]
    async fn test_parametrized_route() {
        let mut app = App::new();
        app.route_with_methods("/{name}", &["get"], |_, resp, params| {
            resp.set_text(format!("Hey {}", params.str("name").unwrap_or_default()));
            Ok(())
        })
        .unwrap();
        let client = app.test_client();
        assert_eq!(client.get("/sdd").await.unwrap().text(), "Hey sdd");
        assert_eq!(client.get("/123").await.unwrap().text(), "Hey 123");
    }

    #[tokio::test]
    async fn test_params_are_passed_correctly() {
        let mut app = App::new();
        app.route("/sum/{num_1:d}/{num_2:d}", |_, resp, params| {
            let a = params.int("num_1").unwrap_or_default();
            let b = params.int("num_2").unwrap_or_default();
            resp.set_text(format!("{a} + {b} = {}", a + b));
            Ok(())
        })
        .unwrap();
        let client = app.test_client();
        assert_eq!(client.get("/sum/12/13").await.unwrap().text(), "12 + 13 = 25");
        assert_eq!(client.get("/sum/12/13/14").await.unwrap().status, 404);
        assert_eq!(client.get("/sum/12/hello").await.unwrap().status, 404);
    }

    #[tokio::test]
    async fn test_default_404_response() {
        let client = App::new().test_client();
        let resp = client.get("/doesnotexist").await.unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.text(), NOT_FOUND_BODY);
    }

    #[tokio::test]
    async fn test_resource_handlers() {
        let mut app = App::new();
        app.resource(
            "/book",
            Resource::new()
                .get(|_, resp, _| {
                    resp.set_text("This is a GET request");
                    Ok(())
                })
                .post(|_, resp, _| {
                    resp.set_text("This is a POST request");
                    Ok(())
                }),
        )
        .unwrap();
        let client = app.test_client();
        assert_eq!(client.get("/book").await.unwrap().text(), "This is a GET request");
        assert_eq!(client.post("/book").await.unwrap().text(), "This is a POST request");
        let err = client.request("DELETE", "/book").await.unwrap_err();
        assert!(err.is_method_not_allowed());
    }

    #[tokio::test]
    async fn test_alternative_route() {
        let mut app = App::new();
        let handler = HandlerRef::function(|_, resp, _| {
            resp.set_text("Alternative way to add a route");
            Ok(())
        });
        app.add_route("/alternative", handler, Some(&["get", "post"])).unwrap();
        let client = app.test_client();
        assert_eq!(
            client.get("/alternative").await.unwrap().text(),
            "Alternative way to add a route"
        );
    }

    #[tokio::test]
    async fn test_allowed_methods_for_function_handlers() {
        let mut app = App::new();
        app.route_with_methods("/home", &["post"], |_, resp, _| {
            resp.set_text("Hello");
            Ok(())
        })
        .unwrap();
        let client = app.test_client();
        assert!(client.get("/home").await.unwrap_err().is_method_not_allowed());
        assert_eq!(client.post("/home").await.unwrap().text(), "Hello");
    }

    #[tokio::test]
    async fn test_custom_exception_handler() {
        let mut app = App::new();
        app.add_exception_handler(|_, resp, _| {
            resp.set_text("AttributeErrorHappened");
            Ok(())
        });
        app.route_with_methods("/", &["get"], |_, _, _| Err("missing attribute".into()))
            .unwrap();
        let client = app.test_client();
        assert_eq!(client.get("/").await.unwrap().text(), "AttributeErrorHappened");
    }

    #[tokio::test]
    async fn test_exception_handler_replaced() {
        let mut app = App::new();
        app.add_exception_handler(|_, resp, _| {
            resp.set_text("first");
            Ok(())
        })
        .add_exception_handler(|_, resp, _| {
            resp.set_text("second");
            Ok(())
        });
        app.route("/", |_, _, _| Err("boom".into())).unwrap();
        let client = app.test_client();
        assert_eq!(client.get("/").await.unwrap().text(), "second");
    }

    #[tokio::test]
    async fn test_template_rendering() {
        let dir = templates_dir();
        let mut app = App::new();
        app.set_templates_dir(&dir);
        let templates = app.templates();
        app.route("/html", move |_, resp, _| {
            resp.set_html(templates.render(
                "index.html",
                json!({"title": "Some Title", "name": "Some Name"}),
            )?);
            Ok(())
        })
        .unwrap();

        let direct = app.template("index.html", json!({"title": "T", "name": "N"})).unwrap();
        assert!(direct.contains("<title>T</title>"));

        let client = app.test_client();
        let resp = client.get("/html").await.unwrap();
        assert!(resp.content_type.contains("text/html"));
        assert!(resp.text().contains("Some Title"));
        assert!(resp.text().contains("Some Name"));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_response_helpers() {
        let mut app = App::new();
        app.route("/json", |_, resp, _| {
            resp.set_json(json!({"name": "Lumos"}));
            Ok(())
        })
        .unwrap()
        .route("/text", |_, resp, _| {
            resp.set_text("Plain text response from LumosWeb");
            Ok(())
        })
        .unwrap()
        .route("/body", |_, resp, _| {
            resp.set_body(b"Byte body".to_vec());
            resp.set_content_type("text/plain");
            Ok(())
        })
        .unwrap();
        let client = app.test_client();

        let resp = client.get("/json").await.unwrap();
        assert_eq!(resp.content_type, "application/json");
        let body: serde_json::Value = resp.json().unwrap();
        assert_eq!(body["name"], "Lumos");

        let resp = client.get("/text").await.unwrap();
        assert!(resp.content_type.contains("text/plain"));
        assert_eq!(resp.text(), "Plain text response from LumosWeb");

        let resp = client.get("/body").await.unwrap();
        assert_eq!(resp.content_type, "text/plain");
        assert_eq!(resp.text(), "Byte body");
    }

    #[tokio::test]
    async fn test_static_assets() {
        let dir = fixture_dir("static");
        std::fs::create_dir_all(dir.join("css")).unwrap();
        std::fs::write(dir.join("css/main.css"), "body {background-color: #d0e4fe}").unwrap();

        let mut app = App::new();
        app.set_static("/static", &dir);
        // A catch-all route must not see asset requests
        app.route("/{anything}", |_, resp, _| {
            resp.set_text("routed");
            Ok(())
        })
        .unwrap();
        let client = app.test_client();

        let resp = client.get("/static/css/main.css").await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.text(), "body {background-color: #d0e4fe}");
        assert_eq!(client.get("/static/main.css)").await.unwrap().status, 404);
        assert_eq!(client.get("/statics").await.unwrap().text(), "routed");
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_middleware_methods_are_called() {
        struct Called {
            request: Arc<AtomicBool>,
            response: Arc<AtomicBool>,
        }

        impl Middleware for Called {
            fn before_request(&self, _req: &Request) {
                self.request.store(true, Ordering::SeqCst);
            }

            fn after_response(&self, _req: &Request, _resp: &mut WireResponse) {
                self.response.store(true, Ordering::SeqCst);
            }
        }

        let request = Arc::new(AtomicBool::new(false));
        let response = Arc::new(AtomicBool::new(false));
        let mut app = App::new();
        app.add_middleware(Called {
            request: Arc::clone(&request),
            response: Arc::clone(&response),
        });
        app.route_with_methods("/", &["get"], |_, resp, _| {
            resp.set_text("Hello Middleware!");
            Ok(())
        })
        .unwrap();

        let client = app.test_client();
        client.get("/").await.unwrap();
        assert!(request.load(Ordering::SeqCst));
        assert!(response.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_static_bypasses_middleware() {
        struct Stamp;
        impl Middleware for Stamp {
            fn after_response(&self, _req: &Request, resp: &mut WireResponse) {
                resp.add_header("X-Stamp", "1");
            }
        }

        let mut app = App::new();
        app.set_static("/static", "/definitely/not/a/lumos/dir");
        app.add_middleware(Stamp);
        let client = app.test_client();

        let resp = client.get("/static/app.js").await.unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.header("X-Stamp"), None);
        let resp = client.get("/missing").await.unwrap();
        assert_eq!(resp.header("X-Stamp"), Some("1"));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::defaults().unwrap();
        config.static_files.prefix = "/assets/".to_string();
        config.http.server_name = "Test/1.0".to_string();
        let service = App::from_config(&config).build();
        assert_eq!(service.static_router().prefix(), "/assets");
        assert_eq!(service.server_name(), "Test/1.0");
    }
}
