//! Logger module
//!
//! Provides logging utilities for the application server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error, warning and debug logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use crate::error::DispatchError;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG: AtomicBool = AtomicBool::new(false);

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    DEBUG.store(config.level.eq_ignore_ascii_case("debug"), Ordering::Relaxed);
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

/// Whether `logging.level = "debug"` was configured
pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Lumos server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    write_info(&format!(
        "Static files: {} -> {}",
        config.static_files.prefix, config.static_files.dir
    ));
    write_info(&format!("Templates: {}", config.templates.dir));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    if let Some(secs) = config.server.serve_timeout {
        write_info(&format!("Serving for {secs}s"));
    }
    write_info("======================================\n");
}

pub fn log_port_in_use(port: u16, next: u16) {
    write_info(&format!("[Bind] Port {port} is in use, trying {next}"));
}

pub fn log_bound(addr: &SocketAddr, attempts: u16) {
    if attempts > 1 {
        write_info(&format!("[Bind] Bound {addr} after {attempts} attempts"));
    } else {
        log_debug(&format!("[Bind] Bound {addr}"));
    }
}

pub fn log_route_registered(pattern: &str) {
    log_debug(&format!("[Route] Registered {pattern}"));
}

pub fn log_hook_replaced() {
    log_warning("Exception handler replaced; only the latest one is used");
}

pub fn log_dispatch_failure(method: &str, path: &str, err: &DispatchError) {
    write_error(&format!("[ERROR] {method} {path} failed: {err}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_server_stopped(addr: &SocketAddr) {
    write_info(&format!("[Shutdown] Server on {addr} stopped"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_debug(message: &str) {
    if debug_enabled() {
        write_info(&format!("[DEBUG] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}
