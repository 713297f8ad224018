// Server module entry point
// Binds with port retry, then runs the accept loop until told to stop

pub mod connection;
pub mod listener;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::app::Service;
use crate::config::Config;
use crate::error::ServerError;
use crate::logger;

pub use listener::{bind_with_retry, create_listener};

/// Transport settings applied to every connection
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    pub keep_alive: bool,
    /// Upper bound on the lifetime of one connection
    pub connection_timeout: Duration,
    pub max_body_size: u64,
    pub max_port_attempts: u16,
    /// Stop accepting after this long; `None` serves until shutdown
    pub serve_timeout: Option<Duration>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            keep_alive: true,
            connection_timeout: Duration::from_secs(30),
            max_body_size: 10_485_760,
            max_port_attempts: 100,
            serve_timeout: None,
        }
    }
}

impl ServerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            keep_alive: config.performance.keep_alive,
            connection_timeout: config.connection_timeout(),
            max_body_size: config.http.max_body_size,
            max_port_attempts: config.server.max_port_attempts,
            serve_timeout: config.serve_timeout(),
        }
    }
}

pub struct Server {
    service: Arc<Service>,
    options: ServerOptions,
    running: Arc<AtomicBool>,
}

impl Server {
    pub fn new(service: Service, options: ServerOptions) -> Self {
        Self {
            service: Arc::new(service),
            options,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True while an accept loop started from this server is active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Bind `host:port`, retrying on the following ports while they are busy
    pub async fn bind(&self, host: &str, port: u16) -> Result<BoundServer, ServerError> {
        let listener = bind_with_retry(host, port, self.options.max_port_attempts).await?;
        let local_addr = listener.local_addr()?;
        Ok(BoundServer {
            listener,
            local_addr,
            service: Arc::clone(&self.service),
            options: self.options,
            running: Arc::clone(&self.running),
        })
    }

    /// Bind and serve until `shutdown` completes or the serve timeout elapses
    pub async fn run<F>(&self, host: &str, port: u16, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        self.bind(host, port).await?.serve_until(shutdown).await;
        Ok(())
    }
}

/// A server holding its listener, ready to accept
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    service: Arc<Service>,
    options: ServerOptions,
    running: Arc<AtomicBool>,
}

impl BoundServer {
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `shutdown` completes or the serve timeout elapses
    ///
    /// Connections already accepted keep running on their own tasks.
    pub async fn serve_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let deadline = async {
            match self.options.serve_timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(shutdown);
        tokio::pin!(deadline);

        self.running.store(true, Ordering::SeqCst);
        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            logger::log_connection_accepted(&peer_addr);
                            connection::handle_connection(
                                stream,
                                peer_addr,
                                Arc::clone(&self.service),
                                self.options,
                            );
                        }
                        Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                    }
                }
                () = &mut shutdown => break,
                () = &mut deadline => break,
            }
        }
        self.running.store(false, Ordering::SeqCst);
        logger::log_server_stopped(&self.local_addr);
    }
}
