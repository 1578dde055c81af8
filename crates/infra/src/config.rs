//! Storage configuration.

use std::time::Duration;

use clap::Args;

/// Database settings. Without a `DATABASE_URL` the service runs on the
/// in-memory store.
#[derive(Debug, Clone, Args)]
pub struct DbConfig {
    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum pooled connections.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,

    /// Connection attempts before giving up.
    #[arg(long, env = "DB_RETRIES", default_value_t = 3)]
    pub db_retries: u32,

    /// Pause between connection attempts (in seconds).
    #[arg(long, env = "DB_RETRY_DELAY_SECS", default_value_t = 3)]
    pub db_retry_delay_secs: u64,
}

impl DbConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.db_retry_delay_secs)
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: 5,
            db_retries: 3,
            db_retry_delay_secs: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        db: DbConfig,
    }

    #[test]
    fn flags_override_defaults() {
        let cli = TestCli::parse_from([
            "test",
            "--database-url",
            "postgres://localhost/shop",
            "--db-retries",
            "7",
            "--db-retry-delay-secs",
            "1",
        ]);
        assert_eq!(cli.db.database_url.as_deref(), Some("postgres://localhost/shop"));
        assert_eq!(cli.db.db_retries, 7);
        assert_eq!(cli.db.retry_delay(), Duration::from_secs(1));
    }

    #[test]
    fn default_matches_flag_defaults() {
        let cli = TestCli::parse_from(["test", "--db-max-connections", "5"]);
        let defaults = DbConfig::default();
        assert_eq!(cli.db.db_max_connections, defaults.db_max_connections);
    }
}
