//! Lumos: a small HTTP application server
//!
//! Register routes on an [`App`], wrap them in [`Middleware`], and serve the
//! built [`Service`] with a [`Server`]:
//!
//! ```no_run
//! use lumos::{App, Server, ServerOptions};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut app = App::new();
//! app.route("/hello/{name}", |_, resp, params| {
//!     resp.set_text(format!("Hello, {}", params.str("name").unwrap_or_default()));
//!     Ok(())
//! })?;
//!
//! let server = Server::new(app.build(), ServerOptions::default());
//! server.run("127.0.0.1", 8080, async {
//!     let _ = tokio::signal::ctrl_c().await;
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod routing;
pub mod server;
pub mod templates;

pub use app::{App, Service, TestClient};
pub use config::Config;
pub use error::{DispatchError, HandlerError, HandlerResult, RouteError, ServerError, TemplateError};
pub use handler::{HandlerRef, Resource};
pub use http::{Request, Response, WireResponse};
pub use middleware::{AccessLog, Middleware};
pub use routing::Params;
pub use server::{Server, ServerOptions};
pub use templates::Templates;
