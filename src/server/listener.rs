// Listener module
// Creates TCP listeners and walks forward from a busy port until one binds

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::logger;

/// Create a `TcpListener` bound to `addr`.
///
/// `SO_REUSEADDR` is set on Unix so a restart can bind over sockets still in
/// `TIME_WAIT`. `SO_REUSEPORT` is deliberately left off: a port another
/// listener holds must fail with `AddrInUse` so the caller can move on.
pub fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    #[cfg(unix)]
    socket.set_reuse_address(true)?;

    // Set non-blocking mode for async compatibility
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

/// Resolve `host` to the first address it names
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| ServerError::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;
    addrs
        .next()
        .ok_or_else(|| ServerError::NoAddress(host.to_string()))
}

/// Bind `host:port`, moving to the next port while the current one is in use
///
/// At most `max_attempts` ports are tried (at least one) and the search never
/// runs past 65535. Failures other than `AddrInUse` are returned immediately.
pub async fn bind_with_retry(
    host: &str,
    port: u16,
    max_attempts: u16,
) -> Result<TcpListener, ServerError> {
    let mut addr = resolve(host, port).await?;
    let max_attempts = max_attempts.max(1);
    let mut attempts: u16 = 0;

    loop {
        attempts += 1;
        match create_listener(addr) {
            Ok(listener) => {
                logger::log_bound(&addr, attempts);
                return Ok(listener);
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                let current = addr.port();
                let next = current.checked_add(1).filter(|_| attempts < max_attempts);
                let Some(next) = next else {
                    return Err(ServerError::PortsExhausted {
                        host: host.to_string(),
                        first: port,
                        last: current,
                    });
                };
                logger::log_port_in_use(current, next);
                addr.set_port(next);
            }
            Err(source) => return Err(ServerError::Bind { addr, source }),
        }
    }
}
