//! Process configuration (flags, with environment fallbacks).

use clap::Parser;

use storefront_infra::DbConfig;
use storefront_observability::LogFormat;

/// Storefront HTTP service.
#[derive(Debug, Clone, Parser)]
#[command(name = "storefront-api")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Port to listen on.
    #[arg(long, env = "HOST_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Log output format (json or pretty).
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub db: DbConfig,
}
