// Connection handling module
// Serves one accepted TCP connection on its own task

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use super::ServerOptions;
use crate::app::Service;
use crate::http::{self, Request};
use crate::logger;

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 connection settings (keep-alive)
/// 3. Serves every request on the connection through the service
/// 4. Applies the configured timeout to the connection
pub fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    service: Arc<Service>,
    options: ServerOptions,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_duration = options.connection_timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(options.keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let service = Arc::clone(&service);
                async move {
                    Ok::<_, Infallible>(
                        serve_request(req, &service, peer_addr, options.max_body_size).await,
                    )
                }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }
    });
}

/// Collect the body, run the service, and turn the outcome into a hyper response
async fn serve_request(
    req: hyper::Request<Incoming>,
    service: &Service,
    peer_addr: SocketAddr,
    max_body_size: u64,
) -> hyper::Response<Full<Bytes>> {
    let server_name = service.server_name();
    let (parts, body) = req.into_parts();

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!(
                "Request body too large for {} (max: {max_body_size} bytes)",
                parts.uri.path()
            ));
            return http::build_413_response(server_name);
        }
        Err(e) => {
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return http::build_400_response(server_name);
        }
    };

    let request = Request::from_parts(parts, body, Some(peer_addr));
    match service.handle(&request).await {
        Ok(wire) => http::build_response(wire, server_name),
        Err(e) => {
            logger::log_dispatch_failure(request.method(), request.path(), &e);
            http::build_500_response(server_name)
        }
    }
}
