// Configuration module entry point
// Loads layered settings: file, then LUMOS_* environment, then defaults

mod types;

use std::time::Duration;

pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StaticFilesConfig,
    TemplatesConfig,
};

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "lumos";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// The file is optional. `LUMOS_SERVER__PORT=9000` overrides `server.port`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_layered(config_path, environment())
    }

    fn load_layered(
        config_path: &str,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(env);
        with_defaults(builder)?.build()?.try_deserialize()
    }

    /// Built-in defaults only, ignoring files and environment
    pub fn defaults() -> Result<Self, config::ConfigError> {
        with_defaults(config::Config::builder())?
            .build()?
            .try_deserialize()
    }

    /// Per-connection timeout: the longer of the read and write timeouts
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(
            self.performance
                .read_timeout
                .max(self.performance.write_timeout),
        )
    }

    pub fn serve_timeout(&self) -> Option<Duration> {
        self.server.serve_timeout.map(Duration::from_secs)
    }
}

/// `LUMOS_*` variables; `__` separates nested keys
fn environment() -> config::Environment {
    config::Environment::with_prefix("LUMOS")
        .prefix_separator("_")
        .separator("__")
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.max_port_attempts", 100)?
        .set_default("static_files.prefix", "/static")?
        .set_default("static_files.dir", "static")?
        .set_default("templates.dir", "templates")?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive", true)?
        .set_default("performance.read_timeout", 30)?
        .set_default("performance.write_timeout", 30)?
        .set_default("http.server_name", "Lumos/0.1")?
        .set_default("http.max_body_size", 10_485_760) // 10MB
}
