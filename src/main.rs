use lumos::config::{Config, DEFAULT_CONFIG_PATH};
use lumos::{
    logger, App, Middleware, Request, Resource, RouteError, Server, ServerOptions, Templates,
    WireResponse,
};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    // Create the Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let app = demo_app(&cfg)?;
    let server = Server::new(app.build(), ServerOptions::from_config(&cfg));

    let bound = server.bind(&cfg.server.host, cfg.server.port).await?;
    logger::log_server_start(&bound.local_addr(), &cfg);

    bound
        .serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
                std::future::pending::<()>().await;
            }
        })
        .await;
    Ok(())
}

/// Logs every request on the way in and out
struct SimpleCustomMiddleware;

impl Middleware for SimpleCustomMiddleware {
    fn before_request(&self, req: &Request) {
        logger::log_debug(&format!("Processing request {}", req.path()));
    }

    fn after_response(&self, req: &Request, _resp: &mut WireResponse) {
        logger::log_debug(&format!("Processing response {}", req.path()));
    }
}

fn demo_app(cfg: &Config) -> Result<App, RouteError> {
    let mut app = App::from_config(cfg);
    let templates = app.templates();
    let error_templates = app.templates();

    app.route_with_methods("/home", &["get"], |_, resp, _| {
        resp.set_text("Hello from the HOME page");
        Ok(())
    })?
    .route_with_methods("/lumos", &["get", "post"], |_, resp, _| {
        resp.set_text("Lights are on!");
        Ok(())
    })?
    .route_with_methods("/hello/{name}", &["get", "post"], |_, resp, params| {
        let name = params.str("name").unwrap_or_default();
        resp.set_text(format!("What are you doing here, {name}"));
        Ok(())
    })?
    .route_with_methods("/book/{title}/page/{page:d}", &["get", "post"], |_, resp, params| {
        let title = params.str("title").unwrap_or_default();
        let page = params.int("page").unwrap_or_default();
        resp.set_text(format!(
            "You are reading the Book: {title}, and you were on Page: {page}"
        ));
        Ok(())
    })?
    .route_with_methods("/sum/{num_1:d}/{num_2:d}", &["get", "post"], |_, resp, params| {
        let a = params.int("num_1").unwrap_or_default();
        let b = params.int("num_2").unwrap_or_default();
        resp.set_text(format!("{a} + {b} = {}", a.saturating_add(b)));
        Ok(())
    })?
    .resource(
        "/book",
        Resource::new()
            .get(|_, resp, _| {
                resp.set_text("Books Page");
                Ok(())
            })
            .post(|_, resp, _| {
                resp.set_text("Endpoint to create a book");
                Ok(())
            }),
    )?
    .route_with_methods("/sample", &["get", "post"], |_, resp, _| {
        resp.set_text("We don't have to use decorators!");
        Ok(())
    })?
    .route_with_methods("/exception", &["get", "post"], |_, _, _| {
        Err("Sorry, This handler should not be used".into())
    })?
    .route_with_methods("/template", &["get", "post"], move |_, resp, _| {
        resp.set_html(templates.render(
            "index.html",
            json!({"name": "LumosWeb", "title": "Lights are on!"}),
        )?);
        Ok(())
    })?
    .route_with_methods("/json", &["get", "post"], |_, resp, _| {
        resp.set_json(json!({"name": "LumosData", "type": "JSON"}));
        Ok(())
    })?
    .route_with_methods("/text", &["get", "post"], |_, resp, _| {
        resp.set_text("This is a plain text");
        Ok(())
    })?;

    app.add_exception_handler(move |_, resp, error| {
        let page = error_templates.render(
            "error.html",
            json!({"name": error.to_string(), "title": "Lights cannot be turned on!"}),
        )?;
        resp.set_status(500);
        resp.set_body(page);
        resp.set_content_type(Templates::content_type("error.html"));
        Ok(())
    })
    .add_middleware(SimpleCustomMiddleware);

    Ok(app)
}
